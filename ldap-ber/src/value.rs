//! Decoded BER values
//!
//! A decoded value keeps the identifier byte it was decoded from where that
//! matters for re-encoding: an LDAP context-specific SEQUENCE must not
//! collapse to a universal SEQUENCE on a decode/encode round trip.

use crate::encoder;
use ldap_core::WireResult;
use serde::{Deserialize, Serialize};

/// Universal identifier bytes for values that do not carry their own
pub(crate) const ID_BOOLEAN: u8 = 0x01;
pub(crate) const ID_INTEGER: u8 = 0x02;
pub(crate) const ID_OCTET_STRING: u8 = 0x04;
pub(crate) const ID_NULL: u8 = 0x05;
pub(crate) const ID_OID: u8 = 0x06;
pub(crate) const ID_SEQUENCE: u8 = 0x30;

/// A decoded BER value
///
/// Strings and arrays carry their originating identifier byte so that
/// protocol-tagged values survive a round trip with their original tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BerValue {
    /// BOOLEAN: true iff the content was not the single octet 0x00
    Boolean(bool),
    /// INTEGER, accumulated big-endian and unsigned
    ///
    /// The protocols modeled here (LDAP message IDs, SNMP counters) only
    /// carry non-negative values, so no two's-complement sign handling is
    /// performed.
    Integer(u64),
    /// Octet string content plus the identifier byte it arrived under
    String { ber_identifier: u8, bytes: Vec<u8> },
    /// NULL
    Null,
    /// OBJECT IDENTIFIER components
    Oid(Vec<u64>),
    /// SEQUENCE/SET content plus the identifier byte it arrived under
    Array {
        ber_identifier: u8,
        items: Vec<BerValue>,
    },
}

impl BerValue {
    /// Convenience constructor for a universal OCTET STRING
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        BerValue::String {
            ber_identifier: ID_OCTET_STRING,
            bytes: bytes.into(),
        }
    }

    /// Convenience constructor for a universal SEQUENCE
    pub fn sequence(items: Vec<BerValue>) -> Self {
        BerValue::Array {
            ber_identifier: ID_SEQUENCE,
            items,
        }
    }

    /// The identifier byte this value re-encodes under
    ///
    /// Strings and arrays report their carried identifier; the other
    /// variants report their canonical universal identifier.
    pub fn ber_identifier(&self) -> u8 {
        match self {
            BerValue::Boolean(_) => ID_BOOLEAN,
            BerValue::Integer(_) => ID_INTEGER,
            BerValue::String { ber_identifier, .. } => *ber_identifier,
            BerValue::Null => ID_NULL,
            BerValue::Oid(_) => ID_OID,
            BerValue::Array { ber_identifier, .. } => *ber_identifier,
        }
    }

    /// String content as UTF-8, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BerValue::String { bytes, .. } => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Raw string content, if this is a string value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            BerValue::String { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Integer content, if this is an integer value
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            BerValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Array items, if this is an array value
    pub fn as_items(&self) -> Option<&[BerValue]> {
        match self {
            BerValue::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Re-encode this value, preserving carried identifiers
    pub fn to_ber(&self) -> WireResult<Vec<u8>> {
        match self {
            BerValue::Boolean(b) => Ok(encoder::encode_boolean(*b)),
            BerValue::Integer(n) => Ok(encoder::encode_integer(*n)),
            BerValue::String {
                ber_identifier,
                bytes,
            } => Ok(encoder::encode_string(bytes, *ber_identifier)),
            BerValue::Null => Ok(encoder::encode_null()),
            BerValue::Oid(components) => encoder::encode_oid(components),
            BerValue::Array {
                ber_identifier,
                items,
            } => {
                let mut chunks = Vec::with_capacity(items.len());
                for item in items {
                    chunks.push(item.to_ber()?);
                }
                Ok(encoder::encode_constructed(&chunks, *ber_identifier))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carried_identifier() {
        let value = BerValue::Array {
            ber_identifier: 0xA0,
            items: vec![],
        };
        assert_eq!(value.ber_identifier(), 0xA0);
        assert_eq!(value.to_ber().unwrap(), vec![0xA0, 0x00]);
    }

    #[test]
    fn test_canonical_identifiers() {
        assert_eq!(BerValue::Boolean(true).ber_identifier(), 0x01);
        assert_eq!(BerValue::Integer(7).ber_identifier(), 0x02);
        assert_eq!(BerValue::Null.ber_identifier(), 0x05);
        assert_eq!(BerValue::Oid(vec![1, 3]).ber_identifier(), 0x06);
        assert_eq!(BerValue::string(b"x".to_vec()).ber_identifier(), 0x04);
        assert_eq!(BerValue::sequence(vec![]).ber_identifier(), 0x30);
    }
}
