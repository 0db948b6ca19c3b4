use std::{fmt, future::Future};

use log::info;
use tokio::sync::OnceCell;

use mural_core::artifact::RenderStyle;

use super::{RenderError, RenderOutput, Renderer};
use crate::config::ThemeConfig;

/// A renderer that is set up on first use.
///
/// The initializer runs at most once to completion. Callers that arrive
/// while it is running wait for the same initialization instead of starting
/// their own. A failed initialization is reported to the callers that were
/// waiting on it, and the next call tries again.
pub struct LazyRenderer<R, F> {
    cell: OnceCell<R>,
    init: F,
}

impl<R, F> fmt::Debug for LazyRenderer<R, F>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRenderer")
            .field("renderer", &self.cell.get())
            .finish_non_exhaustive()
    }
}

impl<R, F, Fut> LazyRenderer<R, F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<R, RenderError>>,
{
    pub fn new(init: F) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
        }
    }

    /// Returns the inner renderer, initializing it if needed.
    ///
    /// # Errors
    ///
    /// Returns the initializer's error if initialization fails.
    pub async fn get(&self) -> Result<&R, RenderError> {
        self.cell
            .get_or_try_init(|| {
                info!("Initializing renderer");
                (self.init)()
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl<R, F, Fut> Renderer for LazyRenderer<R, F>
where
    R: Renderer,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RenderError>> + Send,
{
    async fn render(
        &self,
        source: &str,
        style: RenderStyle,
        theme: &ThemeConfig,
    ) -> Result<RenderOutput, RenderError> {
        let renderer = self.get().await?;
        renderer.render(source, style, theme).await
    }
}
