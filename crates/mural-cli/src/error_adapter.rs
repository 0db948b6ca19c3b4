//! Error adapter for converting MuralError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use mural::{MuralError, RenderError, preset::PRESETS};

/// Adapter giving a [`MuralError`] a diagnostic code and, where there is
/// something the user can do about it, a help message.
pub struct ErrorAdapter<'a>(pub &'a MuralError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            MuralError::Io(_) => "mural::io",
            MuralError::Config(_) => "mural::config",
            MuralError::Codec(_) | MuralError::MissingShareToken => "mural::share_link",
            MuralError::Url(_) => "mural::address",
            MuralError::Render(_) => "mural::render",
            MuralError::UnknownPreset(_) => "mural::preset",
            MuralError::SessionClosed => "mural::session",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            MuralError::Codec(err) if err.is_unsupported_format() => {
                "this link was made by a different version of Mural".to_string()
            }
            MuralError::Codec(_) => "the share link is incomplete or damaged".to_string(),
            MuralError::MissingShareToken => {
                "pass the bare `v1.d.` token or an address containing `#diagram=`".to_string()
            }
            MuralError::Render(RenderError::NotConfigured) => {
                "add `command = [\"<program>\", ...]` under `[renderer]` in config.toml".to_string()
            }
            MuralError::Render(RenderError::NotFound(_) | RenderError::Spawn { .. }) => {
                "install the renderer or fix `[renderer] command` in config.toml".to_string()
            }
            MuralError::UnknownPreset(_) => {
                let names: Vec<_> = PRESETS.iter().map(|preset| preset.name()).collect();
                format!("available presets: {}", names.join(", "))
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wraps an error for rendering by miette.
pub fn to_reportable(err: &MuralError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}
