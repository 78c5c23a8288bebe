//! Type-syntax lookup table
//!
//! BER is self-describing only down to the identifier byte; what a given
//! identifier *means* is protocol-specific. The syntax table maps each of
//! the 256 possible identifier bytes to a semantic type, and is built once
//! from declarative rules (class → encoding → tag → syntax). Protocol
//! layers extend or override the universal defaults by supplying their own
//! rules: later rules overwrite earlier ones at the same index.
//!
//! The table is an explicitly constructed, immutable value passed into the
//! decoder — there is no process-wide mutable state.

use crate::identifier::{Encoding, Identifier, TagClass};
use serde::{Deserialize, Serialize};

/// Semantic type resolved from an identifier byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectSyntax {
    /// ASN.1 BOOLEAN
    Boolean,
    /// ASN.1 INTEGER (decoded unsigned, see the decoder)
    Integer,
    /// Octet string of any flavor
    String,
    /// ASN.1 NULL
    Null,
    /// OBJECT IDENTIFIER
    Oid,
    /// SEQUENCE/SET and their tagged variants
    Array,
}

/// One declarative rule: this (class, encoding, tag) decodes as this syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxRule {
    pub class: TagClass,
    pub encoding: Encoding,
    pub tag: u8,
    pub syntax: ObjectSyntax,
}

impl SyntaxRule {
    pub const fn new(class: TagClass, encoding: Encoding, tag: u8, syntax: ObjectSyntax) -> Self {
        Self {
            class,
            encoding,
            tag,
            syntax,
        }
    }
}

/// The builtin universal rules shared by every ASN.1 protocol
///
/// Tag 10 is ENUMERATED (decoded as an integer), tag 13 RELATIVE-OID
/// content is kept as an opaque string. SET (17) decodes like SEQUENCE.
const UNIVERSAL_RULES: &[SyntaxRule] = &[
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 1, ObjectSyntax::Boolean),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 2, ObjectSyntax::Integer),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 4, ObjectSyntax::String),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 5, ObjectSyntax::Null),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 6, ObjectSyntax::Oid),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 10, ObjectSyntax::Integer),
    SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 13, ObjectSyntax::String),
    SyntaxRule::new(TagClass::Universal, Encoding::Constructed, 16, ObjectSyntax::Array),
    SyntaxRule::new(TagClass::Universal, Encoding::Constructed, 17, ObjectSyntax::Array),
];

/// 256-entry lookup table from identifier byte to semantic type
///
/// # Construction
/// Built once, immutable thereafter. `universal()` gives the ASN.1
/// defaults; `with_overrides()` layers protocol-specific rules on top.
///
/// # Concurrency
/// The table is plain immutable data; share it freely across threads.
#[derive(Clone)]
pub struct SyntaxTable {
    entries: [Option<ObjectSyntax>; 256],
}

impl SyntaxTable {
    /// Compile a flat rule list into a lookup table
    ///
    /// Later rules overwrite earlier ones at the same identifier index.
    pub fn compile(rules: &[SyntaxRule]) -> Self {
        let mut entries = [None; 256];
        for rule in rules {
            let index = Identifier::new(rule.class, rule.encoding, rule.tag).to_byte();
            entries[index as usize] = Some(rule.syntax);
        }
        Self { entries }
    }

    /// The builtin universal table
    pub fn universal() -> Self {
        Self::compile(UNIVERSAL_RULES)
    }

    /// Universal table extended with protocol-specific override rules
    ///
    /// Overrides are applied after the universal rules, so a protocol can
    /// redefine what an identifier byte means (e.g., LDAP's
    /// context-specific constructed 0 = "and" decodes as an array) without
    /// touching the defaults.
    pub fn with_overrides(overrides: &[SyntaxRule]) -> Self {
        let mut table = Self::universal();
        for rule in overrides {
            let index = Identifier::new(rule.class, rule.encoding, rule.tag).to_byte();
            table.entries[index as usize] = Some(rule.syntax);
        }
        table
    }

    /// Resolve an identifier byte to its semantic type
    pub fn lookup(&self, identifier: u8) -> Option<ObjectSyntax> {
        self.entries[identifier as usize]
    }
}

impl Default for SyntaxTable {
    fn default() -> Self {
        Self::universal()
    }
}

impl std::fmt::Debug for SyntaxTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mapped: Vec<u8> = (0u16..256)
            .filter(|&i| self.entries[i as usize].is_some())
            .map(|i| i as u8)
            .collect();
        f.debug_struct("SyntaxTable")
            .field("mapped_identifiers", &mapped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_defaults() {
        let table = SyntaxTable::universal();
        assert_eq!(table.lookup(0x01), Some(ObjectSyntax::Boolean));
        assert_eq!(table.lookup(0x02), Some(ObjectSyntax::Integer));
        assert_eq!(table.lookup(0x04), Some(ObjectSyntax::String));
        assert_eq!(table.lookup(0x05), Some(ObjectSyntax::Null));
        assert_eq!(table.lookup(0x06), Some(ObjectSyntax::Oid));
        assert_eq!(table.lookup(0x30), Some(ObjectSyntax::Array));
        assert_eq!(table.lookup(0x31), Some(ObjectSyntax::Array));
        // Unmapped by default
        assert_eq!(table.lookup(0xA0), None);
    }

    #[test]
    fn test_overrides_extend_defaults() {
        let table = SyntaxTable::with_overrides(&[SyntaxRule::new(
            TagClass::ContextSpecific,
            Encoding::Constructed,
            0,
            ObjectSyntax::Array,
        )]);
        assert_eq!(table.lookup(0xA0), Some(ObjectSyntax::Array));
        // Defaults still present
        assert_eq!(table.lookup(0x02), Some(ObjectSyntax::Integer));
    }

    #[test]
    fn test_later_rule_overwrites() {
        let table = SyntaxTable::with_overrides(&[
            SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 4, ObjectSyntax::Null),
            SyntaxRule::new(TagClass::Universal, Encoding::Primitive, 4, ObjectSyntax::String),
        ]);
        assert_eq!(table.lookup(0x04), Some(ObjectSyntax::String));
    }
}
