//! ldap-wire - wire-level encoding layer for LDAP and SNMP
//!
//! This library implements the encoding layer shared by directory-access
//! and network-management protocols: a general-purpose ASN.1 BER codec
//! and, built atop it, the LDAP search-filter expression model.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ldap-core`: Error handling and the case-insensitive attribute map
//! - `ldap-ber`: BER Tag-Length-Value codec (identifier model, length
//!   codec, type-syntax table, stream/buffer decoders, encoders)
//! - `ldap-filter`: Filter algebra (combinators, RFC 4515 text grammar,
//!   BER bridge, evaluation and visitor contract)
//!
//! # Usage
//!
//! ```rust
//! use ldap_wire::Filter;
//!
//! let filter = Filter::parse("(&(objectClass=person)(cn=J*))")?;
//! let wire = filter.to_ber()?;
//! # let _ = wire;
//! # Ok::<(), ldap_wire::WireError>(())
//! ```

// Re-export core types
pub use ldap_core::{AttributeMap, WireError, WireResult};

// Re-export the BER codec API
pub mod ber {
    pub use ldap_ber::*;
}

// Re-export the filter API
pub use ldap_filter::{filter_syntax, Filter, FilterVisitor};
