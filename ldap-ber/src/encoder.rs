//! BER encoder
//!
//! All encoders are pure functions from a value to its TLV byte sequence:
//! no I/O, no shared state, safe to call concurrently on independent
//! inputs.

use crate::length::encode_length;
use crate::value::{ID_BOOLEAN, ID_INTEGER, ID_NULL, ID_OCTET_STRING, ID_OID};
use ldap_core::{WireError, WireResult};

/// Identifier byte for a universal SEQUENCE (constructed)
pub const SEQUENCE: u8 = 0x30;
/// Identifier byte for a universal SET (constructed)
pub const SET: u8 = 0x31;

/// Wrap pre-encoded TLV chunks under a constructed identifier
///
/// This is the fundamental constructed-type encoding operation: the chunks
/// are concatenated, prefixed with the identifier byte and the encoded
/// length of the concatenation.
pub fn encode_constructed(chunks: &[Vec<u8>], identifier: u8) -> Vec<u8> {
    let content_len: usize = chunks.iter().map(Vec::len).sum();
    let length = encode_length(content_len);

    let mut result = Vec::with_capacity(1 + length.len() + content_len);
    result.push(identifier);
    result.extend_from_slice(&length);
    for chunk in chunks {
        result.extend_from_slice(chunk);
    }
    result
}

/// Encode a SEQUENCE-shaped wrapper with an additive tag offset
///
/// Offset 0 gives a universal SEQUENCE (0x30); protocol layers pass the
/// offset that reaches their tagged variant (e.g. 0x70 for
/// context-specific constructed 0).
pub fn encode_sequence(chunks: &[Vec<u8>], tag_offset: u8) -> Vec<u8> {
    encode_constructed(chunks, SEQUENCE + tag_offset)
}

/// Encode a universal SET (0x31)
pub fn encode_set(chunks: &[Vec<u8>]) -> Vec<u8> {
    encode_constructed(chunks, SET)
}

/// Encode an application-specific constructed wrapper (0x60 + code)
pub fn encode_app_sequence(chunks: &[Vec<u8>], code: u8) -> Vec<u8> {
    encode_constructed(chunks, 0x60 + code)
}

/// Encode a context-specific constructed wrapper (0xA0 + code)
pub fn encode_context_sequence(chunks: &[Vec<u8>], code: u8) -> Vec<u8> {
    encode_constructed(chunks, 0xA0 + code)
}

/// Encode raw bytes as a primitive string under the given identifier
pub fn encode_string(bytes: &[u8], identifier: u8) -> Vec<u8> {
    let length = encode_length(bytes.len());
    let mut result = Vec::with_capacity(1 + length.len() + bytes.len());
    result.push(identifier);
    result.extend_from_slice(&length);
    result.extend_from_slice(bytes);
    result
}

/// Encode a universal OCTET STRING (0x04)
pub fn encode_octet_string(bytes: &[u8]) -> Vec<u8> {
    encode_string(bytes, ID_OCTET_STRING)
}

/// Encode a context-specific primitive string (0x80 + code)
pub fn encode_context_string(bytes: &[u8], code: u8) -> Vec<u8> {
    encode_string(bytes, 0x80 + code)
}

/// Encode an application-specific primitive string (0x40 + code)
pub fn encode_app_string(bytes: &[u8], code: u8) -> Vec<u8> {
    encode_string(bytes, 0x40 + code)
}

/// Encode an INTEGER with unsigned semantics
///
/// The value is laid out as its minimal big-endian octets. No sign bit is
/// reserved: the decoder accumulates unsigned, so an octet with the high
/// bit set stays a large positive value.
pub fn encode_integer(value: u64) -> Vec<u8> {
    let mut octets = Vec::new();
    let mut remaining = value;
    loop {
        octets.push((remaining & 0xFF) as u8);
        remaining >>= 8;
        if remaining == 0 {
            break;
        }
    }
    octets.reverse();

    let mut result = Vec::with_capacity(2 + octets.len());
    result.push(ID_INTEGER);
    result.extend_from_slice(&encode_length(octets.len()));
    result.extend_from_slice(&octets);
    result
}

/// Encode a BOOLEAN (0xFF for true, 0x00 for false)
pub fn encode_boolean(value: bool) -> Vec<u8> {
    vec![ID_BOOLEAN, 0x01, if value { 0xFF } else { 0x00 }]
}

/// Encode a NULL
pub fn encode_null() -> Vec<u8> {
    vec![ID_NULL, 0x00]
}

/// Encode an OBJECT IDENTIFIER per X.690 §8.19
///
/// # Encoding Rules
/// - The first two components X.Y collapse into the single value 40*X + Y.
/// - Every component is packed base-128, continuation bit set on all but
///   the last octet of each component.
///
/// # Error Handling
/// Returns `InvalidOid` when fewer than two components are given or the
/// leading component is outside {0, 1, 2}.
pub fn encode_oid(components: &[u64]) -> WireResult<Vec<u8>> {
    if components.len() < 2 {
        return Err(WireError::InvalidOid(format!(
            "need at least 2 components, got {}",
            components.len()
        )));
    }
    if components[0] > 2 {
        return Err(WireError::InvalidOid(format!(
            "leading component must be 0, 1 or 2, got {}",
            components[0]
        )));
    }

    let mut content = Vec::new();
    pack_base128(components[0] * 40 + components[1], &mut content);
    for &component in &components[2..] {
        pack_base128(component, &mut content);
    }

    let mut result = Vec::with_capacity(2 + content.len());
    result.push(ID_OID);
    result.extend_from_slice(&encode_length(content.len()));
    result.extend_from_slice(&content);
    Ok(result)
}

/// Pack one value as a base-128 varint (continuation bit on all but the
/// last octet)
fn pack_base128(value: u64, out: &mut Vec<u8>) {
    let mut octets = Vec::new();
    let mut remaining = value;
    loop {
        octets.push((remaining & 0x7F) as u8);
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }
    for (i, &octet) in octets.iter().rev().enumerate() {
        if i < octets.len() - 1 {
            out.push(octet | 0x80);
        } else {
            out.push(octet);
        }
    }
}
