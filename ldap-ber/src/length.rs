//! BER length field codec
//!
//! Length can be encoded in two forms:
//! - **Short form** (1 byte): for lengths 0-127, the byte is the length.
//! - **Long form**: first byte is `0x80 | k` where `k` is the number of
//!   following big-endian length octets.
//!
//! Decoding distinguishes "the buffer does not yet hold the complete length
//! field" (a retryable condition on a partial network read, reported as
//! `Ok(None)`) from a genuinely invalid encoding (reported as an error).

use ldap_core::{WireError, WireResult};

/// Encode a length value
///
/// # Encoding Strategy
/// - Length <= 127: short form, a single byte.
/// - Length > 127: long form with the minimal number of big-endian octets
///   (no leading zero octets).
pub fn encode_length(length: usize) -> Vec<u8> {
    if length <= 127 {
        return vec![length as u8];
    }

    // Minimal big-endian octets of the length value
    let mut octets = Vec::new();
    let mut remaining = length;
    while remaining > 0 {
        octets.push((remaining & 0xFF) as u8);
        remaining >>= 8;
    }
    octets.reverse();

    let mut result = Vec::with_capacity(1 + octets.len());
    result.push(0x80 | octets.len() as u8);
    result.extend_from_slice(&octets);
    result
}

/// Decode a length field from the front of a buffer
///
/// # Returns
/// - `Ok(Some((length, octets_consumed)))` on success.
/// - `Ok(None)` when the buffer is too short to hold the complete length
///   field (caller should read more bytes and retry).
/// - `Err(WireError::MalformedLength)` for the indefinite form (`0x80`)
///   or a length-of-length beyond 8 octets.
pub fn decode_length(data: &[u8]) -> WireResult<Option<(usize, usize)>> {
    let Some(&first) = data.first() else {
        return Ok(None);
    };

    if first & 0x80 == 0 {
        // Short form: the byte is the length
        return Ok(Some((first as usize, 1)));
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets == 0 {
        return Err(WireError::MalformedLength(
            "indefinite length form is not supported".to_string(),
        ));
    }
    if num_octets > 8 {
        return Err(WireError::MalformedLength(format!(
            "length-of-length too large: {} octets (max 8)",
            num_octets
        )));
    }
    if data.len() < 1 + num_octets {
        return Ok(None);
    }

    let mut length = 0usize;
    for &octet in &data[1..1 + num_octets] {
        length = length
            .checked_mul(256)
            .map(|l| l | octet as usize)
            .ok_or_else(|| {
                WireError::MalformedLength("length value overflows usize".to_string())
            })?;
    }

    Ok(Some((length, 1 + num_octets)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form() {
        assert_eq!(encode_length(0), vec![0]);
        assert_eq!(encode_length(127), vec![127]);
        assert_eq!(decode_length(&[100]).unwrap(), Some((100, 1)));
    }

    #[test]
    fn test_long_form() {
        assert_eq!(encode_length(128), vec![0x81, 128]);
        assert_eq!(encode_length(1000), vec![0x82, 0x03, 0xE8]);
        assert_eq!(decode_length(&[0x82, 0x03, 0xE8]).unwrap(), Some((1000, 3)));
    }

    #[test]
    fn test_round_trip_sweep() {
        // Representative sweep of the [0, 2^32) range: every power of two
        // and its neighbors, plus the form-switch boundary.
        let mut cases = vec![0usize, 1, 127, 128, 129, 255, 256];
        for shift in 8..32 {
            let p = 1usize << shift;
            cases.extend([p - 1, p, p + 1]);
        }
        for n in cases {
            let encoded = encode_length(n);
            let (decoded, consumed) = decode_length(&encoded).unwrap().unwrap();
            assert_eq!(decoded, n);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_truncated_is_retryable() {
        // Long form announcing 2 octets but providing only 1
        assert_eq!(decode_length(&[0x82, 0x03]).unwrap(), None);
        assert_eq!(decode_length(&[]).unwrap(), None);
    }

    #[test]
    fn test_indefinite_form_rejected() {
        assert!(matches!(
            decode_length(&[0x80]),
            Err(WireError::MalformedLength(_))
        ));
    }

    #[test]
    fn test_oversized_length_of_length_rejected() {
        assert!(matches!(
            decode_length(&[0x89, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            Err(WireError::MalformedLength(_))
        ));
    }
}
