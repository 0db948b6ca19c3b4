//! Error type for share token encoding and decoding.

use std::{io, string::FromUtf8Error};

use thiserror::Error;

/// Errors produced while encoding or decoding a share token.
///
/// Every decoding step reports through exactly one variant; a failed decode
/// never yields partial text.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported share token version/algorithm `{version}.{algorithm}`")]
    UnsupportedFormat { version: String, algorithm: String },

    #[error("share token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("share token payload could not be decompressed: {0}")]
    Decompress(String),

    #[error("decoded diagram exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("decoded diagram is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("failed to compress diagram source: {0}")]
    Compress(#[from] io::Error),
}

impl CodecError {
    /// Returns `true` for errors caused by the shape of the token itself
    /// rather than by the payload contents.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, CodecError::UnsupportedFormat { .. })
    }
}
