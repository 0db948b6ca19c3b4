//! The live editing session.
//!
//! A [`Session`] is the single owner of the diagram source. Edits go through
//! it to the [`RenderScheduler`]; applied results come back through
//! [`Session::next_update`], which feeds the rendered size to the viewport
//! and refreshes the share token in the session's address.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::watch;
use url::Url;

use mural_codec::{
    ShareCodec,
    location::{clear_token, read_token, write_token},
};
use mural_core::{
    artifact::{ExportPlan, ExportScale, RenderResult, RenderStyle},
    viewport::ViewportController,
};

use crate::{
    config::AppConfig,
    error::MuralError,
    preset::{default_preset, find_preset, is_preset},
    render::Renderer,
    scheduler::{AppliedRender, CurrentRender, RenderScheduler},
};

/// Notice shown when the address carried a share token that could not be
/// decoded.
pub const INVALID_SHARE_LINK_NOTICE: &str = "invalid share link";

/// What changed when a render result was applied.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    applied: Arc<AppliedRender>,
    location: Url,
    refitted: bool,
}

impl SessionUpdate {
    pub fn seq(&self) -> u64 {
        self.applied.seq()
    }

    pub fn result(&self) -> &RenderResult {
        self.applied.result()
    }

    /// The session address after the share token was refreshed.
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Whether the viewport was refitted to a surface of new dimensions.
    pub fn refitted(&self) -> bool {
        self.refitted
    }
}

/// A live diagram editing session.
pub struct Session<R: Renderer> {
    source: String,
    style: RenderStyle,
    scheduler: RenderScheduler<R>,
    results: watch::Receiver<CurrentRender>,
    viewport: ViewportController,
    codec: ShareCodec,
    location: Url,
    current: CurrentRender,
    notice: Option<String>,
}

impl<R: Renderer> Session<R> {
    /// Opens a session at `location`.
    ///
    /// The starting diagram comes from the share token in `location` when it
    /// decodes, and from the default preset otherwise. A token that fails to
    /// decode leaves [`INVALID_SHARE_LINK_NOTICE`] in [`Session::notice`].
    /// The starting diagram is rendered immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn open(renderer: R, config: &AppConfig, location: Url) -> Self {
        let codec = config.codec().build();

        let (source, notice) = match read_token(&location) {
            Some(token) => match codec.decode(&token) {
                Ok(source) => {
                    info!(source_len = source.len(); "Opened shared diagram");
                    (source, None)
                }
                Err(err) => {
                    warn!(error:% = err; "Ignoring invalid share link");
                    (
                        default_preset().source().to_string(),
                        Some(INVALID_SHARE_LINK_NOTICE.to_string()),
                    )
                }
            },
            None => (default_preset().source().to_string(), None),
        };

        let mut session = Self::with_source(renderer, config, location, source);
        session.notice = notice;
        session
    }

    /// Opens a session at `location` starting from `source`, ignoring any
    /// share token the address carries. The token is replaced once the
    /// first result is applied.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_source(
        renderer: R,
        config: &AppConfig,
        location: Url,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let scheduler = RenderScheduler::new(
            renderer,
            config.theme().clone(),
            config.scheduler().debounce(),
        );
        let results = scheduler.subscribe();
        let style = config.session().style();
        scheduler.commit_now(source.clone(), style);

        Self {
            source,
            style,
            scheduler,
            results,
            viewport: ViewportController::with_fit_padding(config.viewport().fit_padding()),
            codec: config.codec().build(),
            location,
            current: None,
            notice: None,
        }
    }

    /// Replaces the source and schedules a debounced render.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.source = text.into();
        self.scheduler.on_edit(self.source.clone(), self.style);
    }

    /// Renders the current source now, skipping the debounce delay.
    ///
    /// Returns the sequence number of the issued render.
    pub fn commit(&mut self) -> u64 {
        self.scheduler.commit_now(self.source.clone(), self.style)
    }

    /// Replaces the source with a preset and renders it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::UnknownPreset`] if no preset has that name.
    pub fn apply_preset(&mut self, name: &str) -> Result<u64, MuralError> {
        let preset =
            find_preset(name).ok_or_else(|| MuralError::UnknownPreset(name.to_string()))?;
        debug!(preset = preset.name(); "Applying preset");
        self.source = preset.source().to_string();
        Ok(self.commit())
    }

    /// Switches the render style.
    ///
    /// The current result is cleared right away and any render in flight
    /// for the old style is ignored when it completes.
    pub fn set_style(&mut self, style: RenderStyle) -> u64 {
        debug!(from = self.style.as_str(), to = style.as_str(); "Changing render style");
        self.style = style;
        self.scheduler.invalidate();
        self.current = None;
        self.viewport.set_surface(None);
        self.commit()
    }

    /// Waits for the next applied render result and brings the viewport and
    /// the address up to date with it.
    ///
    /// Returns `None` only if the scheduler has gone away.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            self.results.changed().await.ok()?;
            let Some(applied) = self.results.borrow_and_update().clone() else {
                continue;
            };
            return Some(self.apply(applied));
        }
    }

    fn apply(&mut self, applied: Arc<AppliedRender>) -> SessionUpdate {
        let surface = match applied.result() {
            RenderResult::Visual(_) => applied.result().measure(),
            RenderResult::TextGrid(_) | RenderResult::Failed(_) => None,
        };
        let refitted = self.viewport.set_surface(surface) && surface.is_some();

        self.current = Some(Arc::clone(&applied));
        self.location = self.location_for(&self.source);

        SessionUpdate {
            applied,
            location: self.location.clone(),
            refitted,
        }
    }

    /// Returns `location` with the share token set for `source`, or removed
    /// when `source` is blank or a preset.
    fn location_for(&self, source: &str) -> Url {
        let mut location = self.location.clone();
        if source.trim().is_empty() || is_preset(source) {
            clear_token(&mut location);
            return location;
        }

        match self.codec.encode(source) {
            Ok(token) => write_token(&mut location, &token),
            Err(err) => warn!(error:% = err; "Could not encode share token"),
        }
        location
    }

    /// Returns the share address for the current source, without waiting
    /// for it to render.
    pub fn share_url(&self) -> Url {
        self.location_for(&self.source)
    }

    /// The session address as of the last applied result.
    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn style(&self) -> RenderStyle {
        self.style
    }

    /// A message for the user about how the session was opened, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// The most recently applied render result.
    pub fn current(&self) -> Option<&RenderResult> {
        self.current.as_deref().map(AppliedRender::result)
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn scheduler(&self) -> &RenderScheduler<R> {
        &self.scheduler
    }

    /// Plans an export of the current result at `scale`.
    ///
    /// Returns `None` when nothing exportable is current.
    pub fn export_plan(&self, scale: ExportScale) -> Option<ExportPlan<'_>> {
        let applied = self.current.as_deref()?;
        ExportPlan::for_result(applied.result(), scale)
    }
}
