//! Core types for the LDAP/SNMP wire layer
//!
//! This crate provides the shared error type used by the BER codec and the
//! filter subsystem, plus the case-insensitive attribute map that filter
//! evaluation runs against.

pub mod attributes;
pub mod error;

pub use attributes::AttributeMap;
pub use error::{WireError, WireResult};
