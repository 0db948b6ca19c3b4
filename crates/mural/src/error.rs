//! Error types for Mural operations.
//!
//! This module provides the main error type [`MuralError`] which wraps
//! the error conditions a caller of the session engine can observe.
//! Render failures are not errors at this level: they become
//! [`RenderResult::Failed`](mural_core::artifact::RenderResult::Failed).

use std::io;

use thiserror::Error;

use mural_codec::CodecError;

use crate::render::RenderError;

/// The main error type for Mural operations.
#[derive(Debug, Error)]
pub enum MuralError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid share link: {0}")]
    Codec(#[from] CodecError),

    #[error("Address has no `diagram` parameter")]
    MissingShareToken,

    #[error("Invalid address: {0}")]
    Url(#[from] url::ParseError),

    #[error("Renderer error: {0}")]
    Render(#[from] RenderError),

    #[error("Unknown preset `{0}`")]
    UnknownPreset(String),

    /// The session's scheduler stopped before a result was applied.
    #[error("Session closed before a render was applied")]
    SessionClosed,
}
