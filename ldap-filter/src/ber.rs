//! Filter ↔ BER bridge
//!
//! LDAP encodes a search filter as a CHOICE of context-specific tags:
//!
//! | tag  | form        | meaning          |
//! |------|-------------|------------------|
//! | 0xA0 | constructed | and (SET OF)     |
//! | 0xA1 | constructed | or (SET OF)      |
//! | 0xA2 | constructed | not              |
//! | 0xA3 | constructed | equalityMatch    |
//! | 0xA4 | constructed | substrings       |
//! | 0xA5 | constructed | greaterOrEqual   |
//! | 0xA6 | constructed | lessOrEqual      |
//! | 0x87 | primitive   | present          |
//! | 0xA9 | constructed | extensibleMatch  |
//!
//! There is no not-equal tag; `ne` is emitted as not(equalityMatch).
//! Chains of the same associative operator are coalesced into one n-ary
//! element list before emission, because BER represents and/or as a SET OF
//! Filter rather than nested binary pairs.

use crate::filter::{CompareOp, Filter, Node};
use ldap_ber::{encoder, BerValue, Encoding, ObjectSyntax, SyntaxRule, SyntaxTable, TagClass};
use ldap_core::{WireError, WireResult};
use regex::Regex;
use std::sync::OnceLock;

const TAG_AND: u8 = 0;
const TAG_OR: u8 = 1;
const TAG_NOT: u8 = 2;
const TAG_EQ: u8 = 3;
const TAG_SUBSTRINGS: u8 = 4;
const TAG_GE: u8 = 5;
const TAG_LE: u8 = 6;
const TAG_PRESENT: u8 = 7;
const TAG_EXTENSIBLE: u8 = 9;

/// `attribute[:dn][:matchingRule]` grammar of an extensible match
fn extensible_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([-;\w]*)(:dn)?(:(\w+|[.\w]+))?$").expect("extensible pattern is valid")
    })
}

/// Syntax table for decoding BER-encoded filters
///
/// Maps the filter CHOICE tags onto array/string semantics so that
/// [`ldap_ber::decode_from_buffer`] can produce the tree that
/// [`Filter::parse_ber`] consumes.
pub fn filter_syntax() -> SyntaxTable {
    const RULES: &[SyntaxRule] = &[
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 0, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 1, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 2, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 3, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 4, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 5, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 6, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Constructed, 9, ObjectSyntax::Array),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 0, ObjectSyntax::String),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 1, ObjectSyntax::String),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 2, ObjectSyntax::String),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 3, ObjectSyntax::String),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 4, ObjectSyntax::String),
        SyntaxRule::new(TagClass::ContextSpecific, Encoding::Primitive, 7, ObjectSyntax::String),
    ];
    SyntaxTable::with_overrides(RULES)
}

/// Replace `\xx` hex-pair escapes with their raw bytes
fn unescape(value: &str) -> WireResult<Vec<u8>> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| {
                    WireError::parse_at(i, "invalid escape sequence in filter value")
                })?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Escape the bytes that the text grammar reserves
///
/// Only `(`, `)`, `*`, `\` and NUL are escaped; anything else (including
/// raw UTF-8) passes through so that a text → BER → text round trip is
/// byte-stable.
fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                push_escaped(valid, &mut out);
                return out;
            }
            Err(err) => {
                let (valid, invalid) = rest.split_at(err.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    push_escaped(valid, &mut out);
                }
                // Hex-escape the offending byte and resume after it
                out.push_str(&format!("\\{:02x}", invalid[0]));
                rest = &invalid[1..];
            }
        }
    }
}

fn push_escaped(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '(' | ')' | '*' | '\\' | '\0' => out.push_str(&format!("\\{:02x}", ch as u32)),
            _ => out.push(ch),
        }
    }
}

impl Filter {
    /// Serialize this filter to its BER representation
    pub fn to_ber(&self) -> WireResult<Vec<u8>> {
        match &self.node {
            Node::Compare { op, attribute, value } => match op {
                CompareOp::Eq => encode_equality(attribute, value),
                CompareOp::Ne => {
                    // BER has no not-equal primitive
                    Ok(encoder::encode_context_sequence(
                        &[encode_equality(attribute, value)?],
                        TAG_NOT,
                    ))
                }
                CompareOp::Ge => encode_ordering(attribute, value, TAG_GE),
                CompareOp::Le => encode_ordering(attribute, value, TAG_LE),
                CompareOp::Ex => encode_extensible(attribute, value),
            },
            Node::And(..) => encode_junction(self, JunctionKind::And),
            Node::Or(..) => encode_junction(self, JunctionKind::Or),
            Node::Not(child) => Ok(encoder::encode_context_sequence(
                &[child.to_ber()?],
                TAG_NOT,
            )),
        }
    }

    /// Reconstruct a filter from a decoded BER value
    ///
    /// The dispatch is keyed on the identifier byte the value carries; an
    /// identifier outside the filter CHOICE is `UnsupportedBerFilterTag`.
    pub fn parse_ber(value: &BerValue) -> WireResult<Filter> {
        match value.ber_identifier() {
            0xA0 => parse_junction(value, JunctionKind::And),
            0xA1 => parse_junction(value, JunctionKind::Or),
            0xA2 => {
                let items = expect_items(value)?;
                let [child] = items else {
                    return Err(WireError::UnsupportedBerFilterTag(0xA2));
                };
                Ok(Filter::not(Filter::parse_ber(child)?))
            }
            0xA3 => parse_comparison(value, Filter::eq),
            0xA4 => parse_substrings(value),
            0xA5 => parse_comparison(value, Filter::ge),
            0xA6 => parse_comparison(value, Filter::le),
            0x87 => {
                let bytes = value
                    .as_bytes()
                    .ok_or(WireError::UnsupportedBerFilterTag(0x87))?;
                Ok(Filter::present(escape(bytes)))
            }
            0xA9 => parse_extensible(value),
            other => Err(WireError::UnsupportedBerFilterTag(other)),
        }
    }
}

#[derive(Clone, Copy)]
enum JunctionKind {
    And,
    Or,
}

impl JunctionKind {
    fn tag(self) -> u8 {
        match self {
            JunctionKind::And => TAG_AND,
            JunctionKind::Or => TAG_OR,
        }
    }

    fn combine(self) -> fn(Filter, Filter) -> Filter {
        match self {
            JunctionKind::And => Filter::and,
            JunctionKind::Or => Filter::or,
        }
    }
}

/// Flatten a chain of same-operator binary nodes into one ordered list
///
/// A subtree under a different operator stays opaque: it becomes a single
/// element of the list.
fn coalesce<'a>(filter: &'a Filter, kind: JunctionKind, out: &mut Vec<&'a Filter>) {
    match (&filter.node, kind) {
        (Node::And(left, right), JunctionKind::And)
        | (Node::Or(left, right), JunctionKind::Or) => {
            coalesce(left, kind, out);
            coalesce(right, kind, out);
        }
        _ => out.push(filter),
    }
}

fn encode_junction(filter: &Filter, kind: JunctionKind) -> WireResult<Vec<u8>> {
    let mut elements = Vec::new();
    coalesce(filter, kind, &mut elements);

    let mut chunks = Vec::with_capacity(elements.len());
    for element in elements {
        chunks.push(element.to_ber()?);
    }
    Ok(encoder::encode_context_sequence(&chunks, kind.tag()))
}

fn encode_equality(attribute: &str, value: &str) -> WireResult<Vec<u8>> {
    if value == "*" {
        // Presence test: primitive, content is just the attribute name
        return Ok(encoder::encode_context_string(
            attribute.as_bytes(),
            TAG_PRESENT,
        ));
    }
    if value.contains('*') {
        return encode_substrings(attribute, value);
    }
    Ok(encoder::encode_context_sequence(
        &[
            encoder::encode_octet_string(attribute.as_bytes()),
            encoder::encode_octet_string(&unescape(value)?),
        ],
        TAG_EQ,
    ))
}

fn encode_ordering(attribute: &str, value: &str, tag: u8) -> WireResult<Vec<u8>> {
    Ok(encoder::encode_context_sequence(
        &[
            encoder::encode_octet_string(attribute.as_bytes()),
            encoder::encode_octet_string(&unescape(value)?),
        ],
        tag,
    ))
}

/// Substring fragment tags within the inner SEQUENCE
const SUB_INITIAL: u8 = 0;
const SUB_ANY: u8 = 1;
const SUB_FINAL: u8 = 2;

fn encode_substrings(attribute: &str, value: &str) -> WireResult<Vec<u8>> {
    let segments: Vec<&str> = value.split('*').collect();
    let last = segments.len() - 1;

    let mut fragments = Vec::new();
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            // A leading/trailing empty segment means no initial/final
            // component; empty middles collapse repeated stars.
            continue;
        }
        let tag = if index == 0 {
            SUB_INITIAL
        } else if index == last {
            SUB_FINAL
        } else {
            SUB_ANY
        };
        fragments.push(encoder::encode_context_string(&unescape(segment)?, tag));
    }

    Ok(encoder::encode_context_sequence(
        &[
            encoder::encode_octet_string(attribute.as_bytes()),
            encoder::encode_sequence(&fragments, 0),
        ],
        TAG_SUBSTRINGS,
    ))
}

fn encode_extensible(attribute: &str, value: &str) -> WireResult<Vec<u8>> {
    let captures = extensible_pattern()
        .captures(attribute)
        .ok_or_else(|| WireError::InvalidExtensibleAttribute(attribute.to_string()))?;

    let attr_type = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let dn = captures.get(2).is_some();
    let rule = captures.get(4).map(|m| m.as_str());

    if attr_type.is_empty() && rule.is_none() {
        return Err(WireError::InvalidExtensibleAttribute(attribute.to_string()));
    }

    let mut chunks = Vec::with_capacity(4);
    if let Some(rule) = rule {
        chunks.push(encoder::encode_context_string(rule.as_bytes(), 1));
    }
    if !attr_type.is_empty() {
        chunks.push(encoder::encode_context_string(attr_type.as_bytes(), 2));
    }
    chunks.push(encoder::encode_context_string(&unescape(value)?, 3));
    if dn {
        chunks.push(encoder::encode_context_string(b"1", 4));
    }
    Ok(encoder::encode_context_sequence(&chunks, TAG_EXTENSIBLE))
}

fn expect_items(value: &BerValue) -> WireResult<&[BerValue]> {
    value
        .as_items()
        .ok_or_else(|| WireError::UnsupportedBerFilterTag(value.ber_identifier()))
}

fn expect_string(value: &BerValue) -> WireResult<&[u8]> {
    value
        .as_bytes()
        .ok_or_else(|| WireError::UnsupportedBerFilterTag(value.ber_identifier()))
}

fn parse_junction(value: &BerValue, kind: JunctionKind) -> WireResult<Filter> {
    let items = expect_items(value)?;
    let mut filters = items.iter().map(Filter::parse_ber);
    let Some(first) = filters.next() else {
        return Err(WireError::UnsupportedBerFilterTag(value.ber_identifier()));
    };
    filters.try_fold(first?, |acc, next| Ok(kind.combine()(acc, next?)))
}

fn parse_comparison(
    value: &BerValue,
    build: fn(String, String) -> Filter,
) -> WireResult<Filter> {
    let items = expect_items(value)?;
    let [attribute, target] = items else {
        return Err(WireError::UnsupportedBerFilterTag(value.ber_identifier()));
    };
    Ok(build(
        escape(expect_string(attribute)?),
        escape(expect_string(target)?),
    ))
}

fn parse_substrings(value: &BerValue) -> WireResult<Filter> {
    let items = expect_items(value)?;
    let [attribute, fragments] = items else {
        return Err(WireError::UnsupportedBerFilterTag(value.ber_identifier()));
    };
    let attribute = escape(expect_string(attribute)?);

    let mut reconstructed = String::new();
    let mut saw_final = false;
    for fragment in expect_items(fragments)? {
        let bytes = expect_string(fragment)?;
        match fragment.ber_identifier() {
            0x80 => reconstructed.push_str(&escape(bytes)),
            0x81 => {
                reconstructed.push('*');
                reconstructed.push_str(&escape(bytes));
            }
            0x82 => {
                reconstructed.push('*');
                reconstructed.push_str(&escape(bytes));
                saw_final = true;
            }
            other => return Err(WireError::UnsupportedBerFilterTag(other)),
        }
    }
    if !saw_final {
        reconstructed.push('*');
    }

    Ok(Filter::eq(attribute, reconstructed))
}

fn parse_extensible(value: &BerValue) -> WireResult<Filter> {
    let mut rule = None;
    let mut attr_type = None;
    let mut match_value = None;
    let mut dn = false;

    for item in expect_items(value)? {
        let bytes = expect_string(item)?;
        match item.ber_identifier() {
            0x81 => rule = Some(escape(bytes)),
            0x82 => attr_type = Some(escape(bytes)),
            0x83 => match_value = Some(escape(bytes)),
            0x84 => dn = bytes == b"1" || bytes.eq_ignore_ascii_case(b"true"),
            other => return Err(WireError::UnsupportedBerFilterTag(other)),
        }
    }

    let match_value =
        match_value.ok_or(WireError::UnsupportedBerFilterTag(TAG_EXTENSIBLE))?;

    let mut attribute = attr_type.unwrap_or_default();
    if dn {
        attribute.push_str(":dn");
    }
    if let Some(rule) = rule {
        attribute.push(':');
        attribute.push_str(&rule);
    }

    Ok(Filter::ex(attribute, match_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldap_ber::decode_from_buffer;

    fn round_trip(filter: &Filter) -> Filter {
        let bytes = filter.to_ber().unwrap();
        let syntax = filter_syntax();
        let (decoded, consumed) = decode_from_buffer(&bytes, &syntax).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        Filter::parse_ber(&decoded).unwrap()
    }

    #[test]
    fn test_equality_wire_shape() {
        let bytes = Filter::eq("cn", "ab").to_ber().unwrap();
        assert_eq!(bytes, b"\xA3\x08\x04\x02cn\x04\x02ab");
    }

    #[test]
    fn test_presence_wire_shape() {
        let bytes = Filter::present("objectclass").to_ber().unwrap();
        assert_eq!(bytes, b"\x87\x0bobjectclass");
    }

    #[test]
    fn test_substrings_wire_shape() {
        // "a*b*c" -> initial "a", any "b", final "c"
        let bytes = Filter::eq("cn", "a*b*c").to_ber().unwrap();
        assert_eq!(
            bytes,
            b"\xA4\x0f\x04\x02cn\x30\x09\x80\x01a\x81\x01b\x82\x01c"
        );
    }

    #[test]
    fn test_substrings_trailing_star_has_no_final() {
        let bytes = Filter::eq("cn", "ab*").to_ber().unwrap();
        assert_eq!(bytes, b"\xA4\x0a\x04\x02cn\x30\x04\x80\x02ab");
    }

    #[test]
    fn test_substrings_leading_star_has_no_initial() {
        let bytes = Filter::eq("cn", "*ab").to_ber().unwrap();
        assert_eq!(bytes, b"\xA4\x0a\x04\x02cn\x30\x04\x82\x02ab");
    }

    #[test]
    fn test_ne_encodes_as_not_eq() {
        let ne = Filter::ne("cn", "ab").to_ber().unwrap();
        let not_eq = Filter::not(Filter::eq("cn", "ab")).to_ber().unwrap();
        assert_eq!(ne, not_eq);
        assert_eq!(ne[0], 0xA2);
    }

    #[test]
    fn test_three_way_and_coalesces() {
        // Left-nested pairs flatten to one 0xA0 wrapper with three elements
        let filter = Filter::and(
            Filter::and(Filter::present("a"), Filter::present("b")),
            Filter::present("c"),
        );
        let bytes = filter.to_ber().unwrap();
        assert_eq!(bytes[0], 0xA0);
        let syntax = filter_syntax();
        let (decoded, _) = decode_from_buffer(&bytes, &syntax).unwrap().unwrap();
        assert_eq!(decoded.as_items().unwrap().len(), 3);
    }

    #[test]
    fn test_round_trip_basic_forms() {
        let filters = [
            Filter::eq("foo", "bar"),
            Filter::present("cn"),
            Filter::eq("cn", "a*b*c"),
            Filter::eq("cn", "*ab"),
            Filter::eq("cn", "ab*"),
            Filter::ge("age", "21"),
            Filter::le("age", "65"),
            Filter::ex("foo", "bar"),
            Filter::not(Filter::eq("cn", "x")),
            Filter::and(Filter::eq("a", "1"), Filter::eq("b", "2")),
            Filter::or(Filter::eq("a", "1"), Filter::not(Filter::present("b"))),
        ];
        for filter in &filters {
            assert_eq!(&round_trip(filter), filter);
        }
    }

    #[test]
    fn test_round_trip_coalesced_chain_stays_structurally_equal() {
        // and(and(a,b),c) flattens on emission and re-folds left-nested
        let filter = Filter::and(
            Filter::and(Filter::eq("a", "1"), Filter::eq("b", "2")),
            Filter::eq("c", "3"),
        );
        assert_eq!(round_trip(&filter), filter);
    }

    #[test]
    fn test_round_trip_extensible_with_dn_and_rule() {
        let filter = Filter::parse("(cn:dn:1.2.3.4.5:=John Smith)").unwrap();
        assert_eq!(filter, Filter::ex("cn:dn:1.2.3.4.5", "John Smith"));
        assert_eq!(round_trip(&filter), filter);
    }

    #[test]
    fn test_round_trip_extensible_dn_only() {
        let filter = Filter::parse("(o:dn:=Ace Industry)").unwrap();
        assert_eq!(round_trip(&filter), filter);
    }

    #[test]
    fn test_escaped_star_stays_equality() {
        // An escaped star is a literal byte, not a wildcard: the filter
        // must emit as equalityMatch and come back escaped.
        let filter = Filter::eq("cn", r"a\2ab");
        let bytes = filter.to_ber().unwrap();
        assert_eq!(bytes[0], 0xA3);
        assert_eq!(round_trip(&filter), filter);
    }

    #[test]
    fn test_extensible_rejects_malformed_attribute() {
        assert!(matches!(
            Filter::ex("a b", "x").to_ber(),
            Err(WireError::InvalidExtensibleAttribute(_))
        ));
        assert!(matches!(
            Filter::ex(":dn", "x").to_ber(),
            Err(WireError::InvalidExtensibleAttribute(_))
        ));
    }

    #[test]
    fn test_parse_ber_rejects_unknown_tag() {
        let value = BerValue::Array {
            ber_identifier: 0xA8,
            items: vec![],
        };
        assert!(matches!(
            Filter::parse_ber(&value),
            Err(WireError::UnsupportedBerFilterTag(0xA8))
        ));
    }
}
