//! BER identifier octet model
//!
//! The identifier is the "T" of a TLV unit: one byte combining a tag class,
//! a primitive/constructed flag, and a tag number.

use serde::{Deserialize, Serialize};

/// BER tag class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
///
/// The discriminant of each variant is the class's additive offset within
/// the identifier byte (bits 7-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0x00,
    /// Application class (01)
    Application = 0x40,
    /// Context-specific class (10)
    ContextSpecific = 0x80,
    /// Private class (11)
    Private = 0xC0,
}

impl TagClass {
    /// Extract the tag class from an identifier byte (bits 7-6)
    pub fn from_byte(byte: u8) -> Self {
        match byte & 0xC0 {
            0x00 => TagClass::Universal,
            0x40 => TagClass::Application,
            0x80 => TagClass::ContextSpecific,
            0xC0 => TagClass::Private,
            _ => unreachable!(), // Masked to 2 bits, only 4 possibilities
        }
    }

    /// Additive offset of this class within the identifier byte
    pub fn offset(self) -> u8 {
        self as u8
    }
}

/// Primitive/constructed encoding flag (bit 5 of the identifier byte)
///
/// Primitive values carry raw content octets; constructed values carry a
/// concatenation of nested TLV units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// Primitive encoding (bit 5 clear)
    Primitive = 0x00,
    /// Constructed encoding (bit 5 set)
    Constructed = 0x20,
}

impl Encoding {
    /// Extract the encoding flag from an identifier byte
    pub fn from_byte(byte: u8) -> Self {
        if byte & 0x20 != 0 {
            Encoding::Constructed
        } else {
            Encoding::Primitive
        }
    }

    /// Additive offset of this flag within the identifier byte
    pub fn offset(self) -> u8 {
        self as u8
    }
}

/// Decomposed BER identifier
///
/// # Encoding Format
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
/// Where CC = class, P = primitive (0) or constructed (1), TTTTT = tag
/// number 0-30. Tag bits of 31 signal the multi-byte high-tag-number form,
/// which this codec does not support: such an identifier maps to no entry
/// in any syntax table and decodes as an unsupported object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Tag class
    pub class: TagClass,
    /// Primitive or constructed
    pub encoding: Encoding,
    /// Tag number (0-31; 31 is the unsupported extended-form marker)
    pub tag: u8,
}

impl Identifier {
    /// Create an identifier from its three components
    pub fn new(class: TagClass, encoding: Encoding, tag: u8) -> Self {
        Self {
            class,
            encoding,
            tag: tag & 0x1F,
        }
    }

    /// Compose the single identifier byte: class offset + encoding offset + tag
    pub fn to_byte(self) -> u8 {
        self.class.offset() + self.encoding.offset() + self.tag
    }

    /// Decompose an identifier byte back into its components
    pub fn from_byte(byte: u8) -> Self {
        Self {
            class: TagClass::from_byte(byte),
            encoding: Encoding::from_byte(byte),
            tag: byte & 0x1F,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_universal_integer() {
        let id = Identifier::new(TagClass::Universal, Encoding::Primitive, 2);
        assert_eq!(id.to_byte(), 0x02);
    }

    #[test]
    fn test_compose_universal_sequence() {
        let id = Identifier::new(TagClass::Universal, Encoding::Constructed, 16);
        assert_eq!(id.to_byte(), 0x30);
    }

    #[test]
    fn test_compose_context_constructed() {
        // LDAP "and" filter wrapper
        let id = Identifier::new(TagClass::ContextSpecific, Encoding::Constructed, 0);
        assert_eq!(id.to_byte(), 0xA0);
    }

    #[test]
    fn test_decompose() {
        let id = Identifier::from_byte(0x87);
        assert_eq!(id.class, TagClass::ContextSpecific);
        assert_eq!(id.encoding, Encoding::Primitive);
        assert_eq!(id.tag, 7);
    }

    #[test]
    fn test_round_trip_all_valid_identifiers() {
        for class in [
            TagClass::Universal,
            TagClass::Application,
            TagClass::ContextSpecific,
            TagClass::Private,
        ] {
            for encoding in [Encoding::Primitive, Encoding::Constructed] {
                for tag in 0..32u8 {
                    let id = Identifier::new(class, encoding, tag);
                    let back = Identifier::from_byte(id.to_byte());
                    assert_eq!(back, id);
                }
            }
        }
    }
}
