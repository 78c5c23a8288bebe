//! BER (Basic Encoding Rules) codec shared by the LDAP and SNMP layers
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Identifier] [Length] [Content]
//! ```
//!
//! ## Identifier
//!
//! One byte combining a tag class, a primitive/constructed flag and a tag
//! number:
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! The multi-byte high-tag-number form (tag bits 11111) is not supported;
//! the protocols this codec serves never use it.
//!
//! ## Length
//!
//! - **Short form** (1 byte): for lengths 0-127.
//! - **Long form**: first byte `0x80 | k`, then `k` big-endian octets.
//!
//! Indefinite lengths are not supported (definite length only).
//!
//! ## Content
//!
//! What the content octets mean is resolved through a [`SyntaxTable`]: a
//! 256-entry map from identifier byte to semantic type, built once from
//! declarative rules. Protocol layers pass their own override rules to
//! give meaning to application- and context-specific identifiers (LDAP
//! filter wrappers, SNMP PDU wrappers and counters).
//!
//! ## Decoding modes
//!
//! [`decode_from_buffer`] is non-destructive and reports "not a complete
//! unit yet" as `Ok(None)`, which is the contract that lets a transport
//! buffer partial TCP reads. [`BerReader`] consumes a buffer sequentially
//! and reports clean end of input as `Ok(None)`.

pub mod decoder;
pub mod encoder;
pub mod identifier;
pub mod length;
pub mod syntax;
pub mod value;

pub use decoder::{decode_from_buffer, BerReader};
pub use identifier::{Encoding, Identifier, TagClass};
pub use length::{decode_length, encode_length};
pub use syntax::{ObjectSyntax, SyntaxRule, SyntaxTable};
pub use value::BerValue;
