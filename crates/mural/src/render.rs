//! The boundary between a session and the external diagram renderer.
//!
//! Mural never renders diagrams itself. A [`Renderer`] receives the diagram
//! source, the requested [`RenderStyle`] and the configured theme, and returns
//! either vector markup or a text grid. Any error it returns is turned into a
//! [`RenderResult::Failed`] by the scheduler; nothing past that point sees it
//! as a fault.
//!
//! Two implementations are provided:
//!
//! - [`CommandRenderer`] runs an external program once per render.
//! - [`LazyRenderer`] wraps another renderer that is expensive to set up and
//!   initializes it once, on first use.

mod command;
mod lazy;

use std::{future::Future, io};

use thiserror::Error;

use mural_core::artifact::{RenderResult, RenderStyle};

use crate::config::ThemeConfig;

pub use command::CommandRenderer;
pub use lazy::LazyRenderer;

/// Markup produced by a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    /// Vector markup (SVG).
    Visual(String),

    /// Text-grid markup.
    TextGrid(String),
}

impl RenderOutput {
    pub fn into_result(self) -> RenderResult {
        match self {
            RenderOutput::Visual(markup) => RenderResult::Visual(markup),
            RenderOutput::TextGrid(markup) => RenderResult::TextGrid(markup),
        }
    }
}

/// Errors a renderer can report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer ran and rejected the source.
    #[error("{0}")]
    Rejected(String),

    #[error("failed to run renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("no renderer command configured (set `[renderer] command`)")]
    NotConfigured,

    #[error("renderer program `{0}` was not found")]
    NotFound(String),
}

/// Turns diagram source into markup.
///
/// Implementations must be shareable across tasks: the scheduler calls
/// `render` from spawned tokio tasks, possibly with several calls in flight.
pub trait Renderer: Send + Sync + 'static {
    fn render(
        &self,
        source: &str,
        style: RenderStyle,
        theme: &ThemeConfig,
    ) -> impl Future<Output = Result<RenderOutput, RenderError>> + Send;
}
