//! Codec for request-carried routing labels.
//!
//! A routing-label header value is a percent-encoded JSON object of string
//! labels, e.g. `%7B%22env%22%3A%22prod%22%7D` for `{"env":"prod"}`. A header
//! may appear several times per call; the decoded objects are merged left to
//! right so a later value wins on key collision.
use std::collections::HashMap;

use thiserror::Error;

/// Flat string-to-string label mapping.
pub type Labels = HashMap<String, String>;

/// Errors raised while decoding routing-label header values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelDecodeError {
    /// The value is not valid percent-encoded UTF-8
    #[error("Header value #{index} '{value}' is not valid percent-encoded UTF-8: {reason}")]
    InvalidEncoding {
        /// Position of the value among the header values
        index: usize,
        /// The raw header value
        value: String,
        /// Underlying decoder message
        reason: String,
    },

    /// The decoded value is not a flat JSON object of string labels
    #[error("Header value #{index} '{value}' is not a flat JSON object of string labels: {reason}")]
    InvalidJson {
        /// Position of the value among the header values
        index: usize,
        /// The raw header value
        value: String,
        /// Underlying parser message
        reason: String,
    },

    /// Labels could not be serialized for propagation
    #[error("Failed to encode labels: {0}")]
    Encode(String),
}

/// Result type for label codec operations
pub type LabelCodecResult<T> = Result<T, LabelDecodeError>;

/// Decode and merge every routing-label header value.
///
/// Fails on the first value that cannot be decoded; no partial mapping is
/// returned. An empty input yields an empty mapping.
pub fn decode_labels<I, S>(values: I) -> LabelCodecResult<Labels>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = Labels::new();
    for (index, value) in values.into_iter().enumerate() {
        let labels = decode_value(index, value.as_ref())?;
        merged.extend(labels);
    }
    Ok(merged)
}

/// Position of the first `%` not followed by two hex digits.
fn malformed_escape(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().find_map(|(pos, &byte)| {
        let well_formed = byte != b'%'
            || (bytes.get(pos + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(pos + 2).is_some_and(u8::is_ascii_hexdigit));
        (!well_formed).then_some(pos)
    })
}

fn decode_value(index: usize, raw: &str) -> LabelCodecResult<Labels> {
    if let Some(pos) = malformed_escape(raw) {
        return Err(LabelDecodeError::InvalidEncoding {
            index,
            value: raw.to_string(),
            reason: format!("incomplete or non-hex escape at byte {pos}"),
        });
    }

    // Form-style decoding: '+' is a space.
    let plus_decoded = raw.replace('+', " ");
    let decoded =
        urlencoding::decode(&plus_decoded).map_err(|e| LabelDecodeError::InvalidEncoding {
            index,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

    let labels: Option<Labels> =
        serde_json::from_str(&decoded).map_err(|e| LabelDecodeError::InvalidJson {
            index,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

    Ok(labels.unwrap_or_default())
}

/// Encode labels as a percent-encoded JSON object suitable for the
/// routing-label header.
pub fn encode_labels(labels: &Labels) -> LabelCodecResult<String> {
    let json = serde_json::to_string(labels).map_err(|e| LabelDecodeError::Encode(e.to_string()))?;
    Ok(urlencoding::encode(&json).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_single_value() {
        let decoded = decode_labels(["%7B%22env%22%3A%22prod%22%7D"]).unwrap();
        assert_eq!(decoded, labels(&[("env", "prod")]));
    }

    #[test]
    fn test_decode_empty_input() {
        let values: Vec<String> = vec![];
        assert!(decode_labels(values).unwrap().is_empty());
    }

    #[test]
    fn test_decode_merges_later_wins() {
        let first = encode_labels(&labels(&[("env", "dev"), ("region", "eu")])).unwrap();
        let second = encode_labels(&labels(&[("env", "prod")])).unwrap();

        let decoded = decode_labels([first, second]).unwrap();
        assert_eq!(decoded, labels(&[("env", "prod"), ("region", "eu")]));
    }

    #[test]
    fn test_decode_plain_json_is_accepted() {
        let decoded = decode_labels([r#"{"user":"alice"}"#]).unwrap();
        assert_eq!(decoded, labels(&[("user", "alice")]));
    }

    #[test]
    fn test_decode_plus_as_space() {
        let decoded = decode_labels(["%7B%22name%22%3A%22a+b%22%7D"]).unwrap();
        assert_eq!(decoded, labels(&[("name", "a b")]));
    }

    #[test]
    fn test_decode_null_is_empty() {
        assert!(decode_labels(["null"]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_labels(["%FF%FE"]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidEncoding { index: 0, .. }));
    }

    #[test]
    fn test_decode_rejects_non_hex_escape() {
        let err = decode_labels(["%7B%22a%22%3A%22%ZZ%22%7D"]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidEncoding { index: 0, .. }));
    }

    #[test]
    fn test_decode_rejects_trailing_percent() {
        let valid = "%7B%22a%22%3A%22b%22%7D";
        let err = decode_labels([valid, "%7B%7D%"]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidEncoding { index: 1, .. }));

        let err = decode_labels(["%7B%7D%4"]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_decode_keeps_encoded_plus() {
        let decoded = decode_labels(["%7B%22op%22%3A%22a%2Bb%22%7D"]).unwrap();
        assert_eq!(decoded, labels(&[("op", "a+b")]));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode_labels(["%5B1%2C2%5D"]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidJson { index: 0, .. }));
    }

    #[test]
    fn test_decode_rejects_nested_values() {
        let err = decode_labels([r#"{"a":{"b":"c"}}"#]).unwrap_err();
        assert!(matches!(err, LabelDecodeError::InvalidJson { .. }));
    }

    #[test]
    fn test_one_malformed_value_fails_the_call() {
        let valid = "%7B%22env%22%3A%22prod%22%7D";
        let err = decode_labels([valid, "%7Bnot-json"]).unwrap_err();
        match err {
            LabelDecodeError::InvalidJson { index, value, .. } => {
                assert_eq!(index, 1);
                assert_eq!(value, "%7Bnot-json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_encode_then_decode() {
        let original = labels(&[("k", "v w"), ("x", "{}%&")]);
        let encoded = encode_labels(&original).unwrap();
        assert_eq!(decode_labels([encoded]).unwrap(), original);
    }
}
