//! Text encodings of a data array buffer (the contents of `<Data>`)

use super::numeric::{on_lane, Numeric};
use super::{ElementKind, Endian};

/// A token of an ASCII encoded array that is not a number of the array type
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BadToken {
    pub(crate) index: usize,
    pub(crate) token: String,
}

/// Parse whitespace separated ASCII values, one per lane, into raw bytes with
/// the given byte order.
pub(crate) fn decode_ascii(text: &str, kind: ElementKind, endian: Endian) -> Result<Vec<u8>, BadToken> {
    let width = kind.lane_width();
    let mut bytes = Vec::new();

    for (index, token) in text.split_ascii_whitespace().enumerate() {
        let start = bytes.len();
        bytes.resize(start + width, 0);
        let slot = &mut bytes[start..];

        let parsed = on_lane!(kind.lane(), T => {
            T::parse_ascii(token).and_then(|value| value.encode(slot, endian))
        });

        if parsed.is_none() {
            return Err(BadToken {
                index,
                token: token.to_string(),
            });
        }
    }

    Ok(bytes)
}

/// Render raw bytes as ASCII, `per_line` lanes on each line. `None` if the
/// buffer is not a whole number of lanes.
pub(crate) fn encode_ascii(
    bytes: &[u8],
    kind: ElementKind,
    endian: Endian,
    per_line: usize,
) -> Option<String> {
    let width = kind.lane_width();
    if bytes.len() % width != 0 {
        return None;
    }

    let per_line = per_line.max(1);
    let mut out = String::with_capacity(bytes.len() * 3);

    for (index, lane) in bytes.chunks_exact(width).enumerate() {
        if index > 0 {
            if index % per_line == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }

        on_lane!(kind.lane(), T => {
            T::decode(lane, endian)?.format_ascii(&mut out)
        });
    }

    Some(out)
}

/// base64 payloads may be wrapped over several lines
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.split_ascii_whitespace().collect();
    base64::decode(compact)
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    base64::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_floats() {
        let bytes = decode_ascii("1.5 -2\n 3", ElementKind::Float32, Endian::Little).unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1.5f32.to_le_bytes());

        let text = encode_ascii(&bytes, ElementKind::Float32, Endian::Little, 2).unwrap();
        assert_eq!(text, "1.5 -2.0\n3.0");
    }

    #[test]
    fn ascii_complex_lanes() {
        // a complex element is two tokens
        let bytes = decode_ascii("1 0 2 0", ElementKind::Complex64, Endian::Big).unwrap();
        assert_eq!(bytes.len(), 2 * ElementKind::Complex64.byte_width());
        assert_eq!(&bytes[8..12], &2f32.to_be_bytes());
    }

    #[test]
    fn ascii_bad_token() {
        let err = decode_ascii("1 2 x", ElementKind::Int32, Endian::Little).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.token, "x");
    }

    #[test]
    fn base64_with_line_breaks() {
        let encoded = encode_base64(&[0u8, 1, 2, 3, 4, 5, 6, 7, 8]);
        let wrapped = format!("{}\n  {}", &encoded[..4], &encoded[4..]);
        assert_eq!(decode_base64(&wrapped).unwrap(), vec![0u8, 1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
