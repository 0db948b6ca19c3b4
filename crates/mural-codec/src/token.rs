//! Share token encoding and decoding.

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use log::{debug, trace};

use crate::{
    backend::{BackendPreference, DeflateBackend, select_backend},
    error::CodecError,
};

/// Prefix of every token produced by the current format.
pub const TOKEN_PREFIX: &str = "v1.d.";

/// Version tag understood by this codec.
const VERSION: &str = "v1";

/// Algorithm tag for zlib-wrapped deflate.
const ALGORITHM_DEFLATE: &str = "d";

/// Default upper bound on the size of a decoded diagram.
pub const DEFAULT_MAX_DECODED_LEN: usize = 1024 * 1024;

/// Encoder and decoder for share tokens.
///
/// The codec is stateless apart from its configuration; the compression
/// backend is resolved once at construction.
#[derive(Debug, Clone, Copy)]
pub struct ShareCodec {
    backend: &'static dyn DeflateBackend,
    max_decoded_len: usize,
}

impl Default for ShareCodec {
    fn default() -> Self {
        Self::new(BackendPreference::Auto)
    }
}

impl ShareCodec {
    /// Creates a codec using the backend selected for `preference`.
    pub fn new(preference: BackendPreference) -> Self {
        Self::with_backend(select_backend(preference))
    }

    /// Creates a codec using a specific backend.
    pub fn with_backend(backend: &'static dyn DeflateBackend) -> Self {
        Self {
            backend,
            max_decoded_len: DEFAULT_MAX_DECODED_LEN,
        }
    }

    /// Sets the maximum size, in bytes, of a decoded diagram.
    pub fn with_max_decoded_len(mut self, max_decoded_len: usize) -> Self {
        self.max_decoded_len = max_decoded_len;
        self
    }

    pub fn backend(&self) -> &'static dyn DeflateBackend {
        self.backend
    }

    /// Encodes diagram source into a `v1.d.` token.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Compress`] if the backend fails to compress.
    pub fn encode(&self, source: &str) -> Result<String, CodecError> {
        let compressed = self.backend.compress(source.as_bytes())?;
        let payload = URL_SAFE_NO_PAD.encode(&compressed);
        debug!(
            backend = self.backend.name(),
            source_len = source.len(),
            token_len = TOKEN_PREFIX.len() + payload.len();
            "Encoded share token"
        );
        Ok(format!("{TOKEN_PREFIX}{payload}"))
    }

    /// Decodes a token back into diagram source.
    ///
    /// Tokens starting with `v<N>.` are versioned and must be exactly
    /// `v1.d.<payload>`; any other version or algorithm tag is rejected.
    /// Tokens with no version prefix are decoded as legacy untagged payloads.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] describing the first step that failed:
    /// unsupported format, malformed base64, corrupt or oversized compressed
    /// data, or invalid UTF-8.
    pub fn decode(&self, token: &str) -> Result<String, CodecError> {
        let token = token.trim();
        let payload = match split_versioned(token) {
            Some((VERSION, rest)) => match rest.split_once('.') {
                Some((ALGORITHM_DEFLATE, payload)) => payload,
                Some((algorithm, _)) => return Err(unsupported(VERSION, algorithm)),
                None => return Err(unsupported(VERSION, rest)),
            },
            Some((version, rest)) => {
                let algorithm = rest.split_once('.').map_or(rest, |(algorithm, _)| algorithm);
                return Err(unsupported(version, algorithm));
            }
            None => {
                trace!("Decoding untagged legacy share token");
                token
            }
        };

        let compressed = URL_SAFE.decode(repad(payload))?;
        let bytes = self.backend.decompress(&compressed, self.max_decoded_len)?;
        let source = String::from_utf8(bytes)?;
        debug!(backend = self.backend.name(), source_len = source.len(); "Decoded share token");
        Ok(source)
    }
}

fn unsupported(version: &str, algorithm: &str) -> CodecError {
    CodecError::UnsupportedFormat {
        version: version.to_string(),
        algorithm: algorithm.to_string(),
    }
}

/// Splits `v<digits>.<rest>` into the version tag and the rest.
fn split_versioned(token: &str) -> Option<(&str, &str)> {
    let (version, rest) = token.split_once('.')?;
    let digits = version.strip_prefix('v')?;
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some((version, rest))
}

/// Restores `=` padding so the payload length is a multiple of four.
fn repad(payload: &str) -> String {
    let trimmed = payload.trim_end_matches('=');
    let padding = (4 - trimmed.len() % 4) % 4;
    let mut padded = String::with_capacity(trimmed.len() + padding);
    padded.push_str(trimmed);
    padded.extend(std::iter::repeat_n('=', padding));
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_has_prefix_and_no_padding() {
        let codec = ShareCodec::default();
        for source in ["", "a", "ab", "abc", "graph LR\n  A --> B\n"] {
            let token = codec.encode(source).unwrap();
            assert!(token.starts_with(TOKEN_PREFIX), "{token}");
            let payload = &token[TOKEN_PREFIX.len()..];
            assert!(!payload.contains('='));
            assert!(
                payload
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            );
        }
    }

    #[test]
    fn test_roundtrip_edge_cases() {
        let codec = ShareCodec::default();
        let long = "flowchart TD\n".to_string() + &"  node_a --> node_b\n".repeat(400);
        for source in ["", " ", "日本語 ✓ 🎨", "a\r\nb\tc", long.as_str()] {
            let token = codec.encode(source).unwrap();
            assert_eq!(codec.decode(&token).unwrap(), source);
        }
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let codec = ShareCodec::default();
        let err = codec.decode("v1.z.AAAA").unwrap_err();
        assert!(err.is_unsupported_format());
        assert!(err.to_string().contains("v1.z"), "{err}");
    }

    #[test]
    fn test_bare_version_is_rejected() {
        let codec = ShareCodec::default();
        assert!(codec.decode("v1.").unwrap_err().is_unsupported_format());
        assert!(codec.decode("v1.x").unwrap_err().is_unsupported_format());
        assert!(codec.decode("v1.x.payload").unwrap_err().is_unsupported_format());
    }

    #[test]
    fn test_future_version_is_rejected() {
        let codec = ShareCodec::default();
        let token = codec.encode("graph TD").unwrap().replacen("v1.", "v2.", 1);
        let err = codec.decode(&token).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFormat { ref version, ref algorithm }
                if version == "v2" && algorithm == "d"
        ));
    }

    #[test]
    fn test_legacy_untagged_payload_decodes() {
        let codec = ShareCodec::default();
        let token = codec.encode("legacy diagram").unwrap();
        let legacy = &token[TOKEN_PREFIX.len()..];
        assert_eq!(codec.decode(legacy).unwrap(), "legacy diagram");
    }

    #[test]
    fn test_not_a_token_fails_cleanly() {
        let codec = ShareCodec::default();
        let err = codec.decode("not-a-token").unwrap_err();
        assert!(!err.is_unsupported_format());
    }

    #[test]
    fn test_malformed_base64_is_rejected() {
        let codec = ShareCodec::default();
        assert!(matches!(
            codec.decode("v1.d.@@@@").unwrap_err(),
            CodecError::Base64(_)
        ));
        // A length of 4n+1 can never be valid base64.
        assert!(matches!(
            codec.decode("v1.d.AAAAA").unwrap_err(),
            CodecError::Base64(_)
        ));
    }

    #[test]
    fn test_corrupt_payload_is_rejected() {
        let codec = ShareCodec::default();
        let token = codec.encode("some diagram that compresses").unwrap();
        let truncated = &token[..token.len() - 6];
        assert!(codec.decode(truncated).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let codec = ShareCodec::default();
        let compressed = codec.backend().compress(&[0xff, 0xfe, 0x00]).unwrap();
        let token = format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(compressed));
        assert!(matches!(
            codec.decode(&token).unwrap_err(),
            CodecError::Utf8(_)
        ));
    }

    #[test]
    fn test_decoded_size_limit() {
        let codec = ShareCodec::default().with_max_decoded_len(64);
        let token = codec.encode(&"x".repeat(1000)).unwrap();
        assert!(matches!(
            codec.decode(&token).unwrap_err(),
            CodecError::TooLarge { limit: 64 }
        ));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let codec = ShareCodec::default();
        let token = codec.encode("ab").unwrap();
        let padded = repad(&token);
        assert_eq!(codec.decode(&padded).unwrap(), "ab");
    }

    #[test]
    fn test_repad() {
        assert_eq!(repad(""), "");
        assert_eq!(repad("AB"), "AB==");
        assert_eq!(repad("ABC"), "ABC=");
        assert_eq!(repad("ABCD"), "ABCD");
        assert_eq!(repad("AB=="), "AB==");
    }

    #[test]
    fn test_split_versioned() {
        assert_eq!(split_versioned("v1.d.xyz"), Some(("v1", "d.xyz")));
        assert_eq!(split_versioned("v12.q"), Some(("v12", "q")));
        assert_eq!(split_versioned("v.d.xyz"), None);
        assert_eq!(split_versioned("vx.d"), None);
        assert_eq!(split_versioned("eJzLSM3JyQcABiwCFQ"), None);
    }
}
