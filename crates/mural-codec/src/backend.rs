//! Compression backends for share tokens.
//!
//! Tokens carry zlib-wrapped deflate data compressed at maximum effort. Two
//! interchangeable backends implement [`DeflateBackend`]:
//!
//! - [`StreamingBackend`] feeds data through `flate2`'s streaming encoder and
//!   an incremental inflater. Available with the `streaming` feature.
//! - [`InProcessBackend`] compresses and inflates in one shot with
//!   `miniz_oxide`, with no feature requirements.
//!
//! Either backend decodes what the other produced. The backend is chosen once
//! per [`ShareCodec`](crate::ShareCodec) by [`select_backend`].

use std::fmt;

use log::debug;
use miniz_oxide::inflate::TINFLStatus;
use serde::Deserialize;

use crate::error::CodecError;

/// Compression level used by both backends.
pub const COMPRESSION_LEVEL: u8 = 9;

/// A deflate implementation able to produce and consume zlib streams.
pub trait DeflateBackend: fmt::Debug + Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Compresses `data` at maximum effort.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Inflates a complete zlib stream.
    ///
    /// # Errors
    ///
    /// Fails on corrupt or truncated input, and with [`CodecError::TooLarge`]
    /// when the output would exceed `limit` bytes.
    fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError>;
}

/// Which backend a codec should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendPreference {
    /// The streaming backend when compiled in, else the in-process one.
    #[default]
    Auto,
    Streaming,
    InProcess,
}

/// One-shot backend built on `miniz_oxide`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessBackend;

impl DeflateBackend for InProcessBackend {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(miniz_oxide::deflate::compress_to_vec_zlib(
            data,
            COMPRESSION_LEVEL,
        ))
    }

    fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(data, limit).map_err(|err| {
            match err.status {
                TINFLStatus::HasMoreOutput => CodecError::TooLarge { limit },
                TINFLStatus::FailedCannotMakeProgress | TINFLStatus::NeedsMoreInput => {
                    CodecError::Decompress("compressed stream is truncated".to_string())
                }
                TINFLStatus::Adler32Mismatch => {
                    CodecError::Decompress("checksum mismatch".to_string())
                }
                status => CodecError::Decompress(format!("corrupt compressed stream ({status:?})")),
            }
        })
    }
}

#[cfg(feature = "streaming")]
pub use streaming::StreamingBackend;

#[cfg(feature = "streaming")]
mod streaming {
    use std::io::Write;

    use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};

    use super::{COMPRESSION_LEVEL, DeflateBackend};
    use crate::error::CodecError;

    /// Output buffer growth step while inflating.
    const CHUNK: usize = 16 * 1024;

    /// Streaming backend built on `flate2`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct StreamingBackend;

    impl DeflateBackend for StreamingBackend {
        fn name(&self) -> &'static str {
            "streaming"
        }

        fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
            let mut encoder = ZlibEncoder::new(
                Vec::with_capacity(data.len() / 2 + 16),
                Compression::new(u32::from(COMPRESSION_LEVEL)),
            );
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }

        fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
            let mut inflater = Decompress::new(true);
            let mut output = Vec::with_capacity(CHUNK.min(limit.saturating_add(1)));

            loop {
                let consumed = inflater.total_in() as usize;
                let produced = inflater.total_out();
                let status = inflater
                    .decompress_vec(&data[consumed..], &mut output, FlushDecompress::None)
                    .map_err(|err| CodecError::Decompress(err.to_string()))?;

                if output.len() > limit {
                    return Err(CodecError::TooLarge { limit });
                }
                if status == Status::StreamEnd {
                    return Ok(output);
                }
                if output.len() == output.capacity() {
                    output.reserve(CHUNK);
                    continue;
                }

                // Room left in the output buffer, so the inflater is waiting
                // on input that does not exist.
                let progressed =
                    inflater.total_in() as usize > consumed || inflater.total_out() > produced;
                if !progressed {
                    return Err(CodecError::Decompress(
                        "compressed stream is truncated".to_string(),
                    ));
                }
            }
        }
    }
}

#[cfg(feature = "streaming")]
static STREAMING: StreamingBackend = StreamingBackend;

static IN_PROCESS: InProcessBackend = InProcessBackend;

/// Resolves a preference to a concrete backend.
///
/// Asking for the streaming backend in a build without the `streaming`
/// feature falls back to the in-process backend.
pub fn select_backend(preference: BackendPreference) -> &'static dyn DeflateBackend {
    let backend: &'static dyn DeflateBackend = match preference {
        BackendPreference::InProcess => &IN_PROCESS,
        BackendPreference::Auto | BackendPreference::Streaming => streaming_or_fallback(preference),
    };
    debug!(preference:? = preference, backend = backend.name(); "Selected compression backend");
    backend
}

#[cfg(feature = "streaming")]
fn streaming_or_fallback(_preference: BackendPreference) -> &'static dyn DeflateBackend {
    &STREAMING
}

#[cfg(not(feature = "streaming"))]
fn streaming_or_fallback(preference: BackendPreference) -> &'static dyn DeflateBackend {
    if preference == BackendPreference::Streaming {
        log::warn!("Streaming compression backend not compiled in, using in-process backend");
    }
    &IN_PROCESS
}
