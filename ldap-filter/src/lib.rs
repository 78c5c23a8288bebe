//! LDAP search filter domain model
//!
//! A [`Filter`] is an immutable expression tree that can be:
//! - built programmatically through factories and combinators,
//! - rendered to and parsed from the RFC 2254/4515 text grammar,
//! - serialized to and from BER (via the `ldap-ber` codec),
//! - evaluated against an attribute map, or walked with a visitor that
//!   supplies its own evaluation semantics.
//!
//! The three representations (tree, text, BER) round-trip: a filter
//! parsed back from either serialized form is structurally equal to the
//! original, with same-operator and/or chains compared after coalescing.

pub mod ber;
pub mod filter;
mod parser;

pub use ber::filter_syntax;
pub use filter::{Filter, FilterVisitor};
