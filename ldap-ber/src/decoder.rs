//! BER decoder
//!
//! Reads one Tag-Length-Value unit at a time and recursively converts it
//! into a [`BerValue`] using a caller-supplied [`SyntaxTable`]. Two
//! operating modes are offered:
//!
//! - [`decode_from_buffer`]: non-destructive with an explicit consumed-byte
//!   count. Returns `Ok(None)` while the buffer does not yet hold one
//!   complete unit, which lets a caller accumulate partial TCP reads and
//!   retry without treating the shortfall as an error.
//! - [`BerReader`]: consuming-stream mode over a borrowed buffer with an
//!   advancing cursor; yields `Ok(None)` at clean end of input.
//!
//! Decoding is purely a function of the input bytes and the syntax table:
//! no hidden state, fully deterministic.

use crate::length::decode_length;
use crate::syntax::{ObjectSyntax, SyntaxTable};
use crate::value::BerValue;
use ldap_core::{WireError, WireResult};
use log::{debug, trace};

/// Split one raw TLV off the front of a buffer
///
/// # Returns
/// `Ok(Some((identifier, content, consumed)))` when a complete unit is
/// present, `Ok(None)` when more bytes are needed, `Err` when the length
/// field itself is malformed.
fn split_tlv(buf: &[u8]) -> WireResult<Option<(u8, &[u8], usize)>> {
    let Some(&identifier) = buf.first() else {
        return Ok(None);
    };
    let Some((length, length_octets)) = decode_length(&buf[1..])? else {
        return Ok(None);
    };

    let header = 1 + length_octets;
    let total = header
        .checked_add(length)
        .ok_or_else(|| WireError::MalformedLength("TLV length overflows usize".to_string()))?;
    if buf.len() < total {
        return Ok(None);
    }

    Ok(Some((identifier, &buf[header..total], total)))
}

/// Convert the content octets of one TLV into a value
fn decode_value(identifier: u8, content: &[u8], syntax: &SyntaxTable) -> WireResult<BerValue> {
    let Some(object_syntax) = syntax.lookup(identifier) else {
        debug!(
            "no syntax mapping for identifier 0x{:02X} ({} content octets)",
            identifier,
            content.len()
        );
        return Err(WireError::UnsupportedObjectType(identifier));
    };
    trace!(
        "decoding identifier 0x{:02X} as {:?}, {} content octets",
        identifier,
        object_syntax,
        content.len()
    );

    match object_syntax {
        ObjectSyntax::Boolean => Ok(BerValue::Boolean(content != [0x00])),
        ObjectSyntax::Integer => decode_integer_content(content),
        ObjectSyntax::String => Ok(BerValue::String {
            ber_identifier: identifier,
            bytes: content.to_vec(),
        }),
        ObjectSyntax::Null => Ok(BerValue::Null),
        ObjectSyntax::Oid => decode_oid_content(content),
        ObjectSyntax::Array => {
            let mut items = Vec::new();
            let mut remaining = content;
            while !remaining.is_empty() {
                // The outer length promised complete nested units, so a
                // short read here is malformed data, not a retry case.
                let Some((nested_id, nested_content, consumed)) = split_tlv(remaining)? else {
                    return Err(WireError::MalformedLength(
                        "truncated element inside constructed value".to_string(),
                    ));
                };
                items.push(decode_value(nested_id, nested_content, syntax)?);
                remaining = &remaining[consumed..];
            }
            Ok(BerValue::Array {
                ber_identifier: identifier,
                items,
            })
        }
    }
}

/// Big-endian unsigned accumulation of INTEGER content
///
/// No two's-complement sign extension: the protocols modeled here only
/// carry non-negative integers (message IDs, counters).
fn decode_integer_content(content: &[u8]) -> WireResult<BerValue> {
    if content.len() > 8 {
        return Err(WireError::IntegerTooLarge(content.len()));
    }
    let mut value = 0u64;
    for &octet in content {
        value = (value << 8) | octet as u64;
    }
    Ok(BerValue::Integer(value))
}

/// Unpack OBJECT IDENTIFIER content octets
///
/// The first base-128 varint `f` folds the conventional leading pair back
/// out as `(f / 40, f % 40)`, unless `f >= 80` in which case the pair is
/// `(2, f - 80)`. The asymmetry exists because only the 2.x arc has second
/// components of 40 and above.
fn decode_oid_content(content: &[u8]) -> WireResult<BerValue> {
    let mut components = Vec::new();
    let mut pos = 0;
    while pos < content.len() {
        let mut value = 0u64;
        loop {
            let octet = content[pos];
            pos += 1;
            value = value
                .checked_mul(128)
                .map(|v| v + (octet & 0x7F) as u64)
                .ok_or_else(|| {
                    WireError::InvalidOid("component overflows u64".to_string())
                })?;
            if octet & 0x80 == 0 {
                break;
            }
            if pos >= content.len() {
                return Err(WireError::InvalidOid(
                    "continuation bit set on final content octet".to_string(),
                ));
            }
        }
        if components.is_empty() {
            if value >= 80 {
                components.push(2);
                components.push(value - 80);
            } else {
                components.push(value / 40);
                components.push(value % 40);
            }
        } else {
            components.push(value);
        }
    }
    Ok(BerValue::Oid(components))
}

/// Decode one value from the front of a buffer without consuming it
///
/// # Returns
/// - `Ok(Some((value, bytes_consumed)))` when the buffer starts with a
///   complete TLV unit.
/// - `Ok(None)` when the buffer does not yet contain a complete unit (the
///   caller should buffer more input and retry).
/// - `Err` for malformed data or an identifier with no syntax mapping.
pub fn decode_from_buffer(
    buf: &[u8],
    syntax: &SyntaxTable,
) -> WireResult<Option<(BerValue, usize)>> {
    let Some((identifier, content, consumed)) = split_tlv(buf)? else {
        return Ok(None);
    };
    let value = decode_value(identifier, content, syntax)?;
    Ok(Some((value, consumed)))
}

/// Consuming-stream decoder over a borrowed buffer
///
/// The reader maintains a cursor that advances as values are decoded,
/// allowing sequential decoding of multiple top-level units from the same
/// buffer.
///
/// # Usage Example
/// ```rust
/// use ldap_ber::{BerReader, SyntaxTable};
///
/// let syntax = SyntaxTable::universal();
/// let mut reader = BerReader::new(b"\x02\x01\x05\x04\x02hi", &syntax);
/// while let Some(value) = reader.next_value()? {
///     println!("{value:?}");
/// }
/// # Ok::<(), ldap_core::WireError>(())
/// ```
pub struct BerReader<'a> {
    buffer: &'a [u8],
    position: usize,
    syntax: &'a SyntaxTable,
}

impl<'a> BerReader<'a> {
    /// Create a reader over a buffer with the given syntax table
    pub fn new(buffer: &'a [u8], syntax: &'a SyntaxTable) -> Self {
        Self {
            buffer,
            position: 0,
            syntax,
        }
    }

    /// Current cursor position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Whether any input remains
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Decode the next value, advancing the cursor
    ///
    /// # Returns
    /// `Ok(None)` at clean end of input. Input that ends in the middle of
    /// a TLV unit is a `MalformedLength` error: unlike the buffered mode,
    /// the stream has nowhere to get more bytes from.
    pub fn next_value(&mut self) -> WireResult<Option<BerValue>> {
        if !self.has_remaining() {
            return Ok(None);
        }
        match decode_from_buffer(&self.buffer[self.position..], self.syntax)? {
            Some((value, consumed)) => {
                self.position += consumed;
                Ok(Some(value))
            }
            None => Err(WireError::MalformedLength(
                "input ends in the middle of a TLV unit".to_string(),
            )),
        }
    }
}
