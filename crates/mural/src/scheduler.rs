//! Debounced, fenced render scheduling.
//!
//! The [`RenderScheduler`] sits between a stream of edits and the external
//! [`Renderer`]. It guarantees two things:
//!
//! - **Debounce**: edits arriving within the quiet period collapse into one
//!   render of the latest text. Each edit restarts the timer.
//! - **Last-issued-wins**: every issued render is stamped with the next value
//!   of a single counter. A completion is applied only if its stamp is still
//!   the latest one issued, so a slow early render can never overwrite a
//!   fast later one.
//!
//! In-flight renders are never cancelled; their results are just dropped when
//! stale. Pending debounce timers are cancelled.
//!
//! Applied results are published through a [`tokio::sync::watch`] channel.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{debug, trace};
use tokio::{sync::watch, task::JoinHandle};

use mural_core::artifact::{RenderResult, RenderStyle};

use crate::{config::ThemeConfig, render::Renderer};

/// A render that has been issued, stamped with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    seq: u64,
    source: String,
    style: RenderStyle,
}

impl RenderRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn style(&self) -> RenderStyle {
        self.style
    }
}

/// A render result that became current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRender {
    seq: u64,
    result: RenderResult,
}

impl AppliedRender {
    /// Sequence number of the request that produced this result.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn result(&self) -> &RenderResult {
        &self.result
    }
}

/// Latest published result, or `None` when nothing is current.
pub type CurrentRender = Option<Arc<AppliedRender>>;

struct PendingEdit {
    generation: u64,
    source: String,
    style: RenderStyle,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Fence {
    /// Stamp of the most recently issued render.
    issued: u64,
    /// Bumped on every edit; a timer only fires for its own generation.
    edit_generation: u64,
    pending: Option<PendingEdit>,
}

impl Fence {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.timer.abort();
            trace!(generation = pending.generation; "Pending edit cancelled");
        }
    }
}

struct Inner<R> {
    renderer: R,
    theme: ThemeConfig,
    debounce: Duration,
    fence: Mutex<Fence>,
    results: watch::Sender<CurrentRender>,
}

impl<R: Renderer> Inner<R> {
    fn lock(&self) -> MutexGuard<'_, Fence> {
        self.fence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire_pending(self: &Arc<Self>, generation: u64) {
        let mut fence = self.lock();
        match fence.pending.take() {
            Some(pending) if pending.generation == generation => {
                self.issue_locked(&mut fence, pending.source, pending.style);
            }
            other => fence.pending = other,
        }
    }

    fn issue_locked(
        self: &Arc<Self>,
        fence: &mut Fence,
        source: String,
        style: RenderStyle,
    ) -> u64 {
        fence.issued += 1;
        let request = RenderRequest {
            seq: fence.issued,
            source,
            style,
        };
        debug!(
            seq = request.seq,
            style = style.as_str(),
            source_len = request.source.len();
            "Render issued"
        );

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = match inner
                .renderer
                .render(&request.source, request.style, &inner.theme)
                .await
            {
                Ok(output) => output.into_result(),
                Err(err) => {
                    debug!(seq = request.seq, error:% = err; "Render failed");
                    RenderResult::Failed(err.to_string())
                }
            };
            inner.apply(request.seq, result);
        });

        fence.issued
    }

    fn apply(&self, seq: u64, result: RenderResult) {
        let fence = self.lock();
        if seq != fence.issued {
            trace!(seq = seq, latest = fence.issued; "Discarding stale render");
            return;
        }
        debug!(seq = seq, failed = result.is_failed(); "Render applied");
        self.results
            .send_replace(Some(Arc::new(AppliedRender { seq, result })));
    }
}

/// Debounces edits and applies only the most recently issued render.
///
/// Scheduling methods spawn tokio tasks and must be called from within a
/// tokio runtime.
pub struct RenderScheduler<R> {
    inner: Arc<Inner<R>>,
}

impl<R: Renderer> RenderScheduler<R> {
    pub fn new(renderer: R, theme: ThemeConfig, debounce: Duration) -> Self {
        let (results, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                renderer,
                theme,
                debounce,
                fence: Mutex::new(Fence::default()),
                results,
            }),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    /// Records `source` as the latest edit and restarts the debounce timer.
    ///
    /// When the timer expires without another edit, a render of `source` is
    /// issued. Earlier pending edits are discarded.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn on_edit(&self, source: impl Into<String>, style: RenderStyle) {
        let mut fence = self.inner.lock();
        fence.cancel_pending();
        fence.edit_generation += 1;
        let generation = fence.edit_generation;

        let inner = Arc::clone(&self.inner);
        let debounce = self.inner.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.fire_pending(generation);
        });

        fence.pending = Some(PendingEdit {
            generation,
            source: source.into(),
            style,
            timer,
        });
        trace!(generation = generation; "Edit scheduled");
    }

    /// Cancels any pending edit and issues a render of `source` immediately.
    ///
    /// Returns the sequence number of the issued render.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn commit_now(&self, source: impl Into<String>, style: RenderStyle) -> u64 {
        let mut fence = self.inner.lock();
        fence.cancel_pending();
        self.inner.issue_locked(&mut fence, source.into(), style)
    }

    /// Fences every in-flight render and clears the current result.
    ///
    /// Any pending edit is dropped as well. Nothing is issued.
    pub fn invalidate(&self) {
        let mut fence = self.inner.lock();
        fence.cancel_pending();
        fence.issued += 1;
        debug!(fence = fence.issued; "Renders invalidated");
        self.inner.results.send_replace(None);
    }

    /// Subscribes to applied results.
    pub fn subscribe(&self) -> watch::Receiver<CurrentRender> {
        self.inner.results.subscribe()
    }

    /// Returns the latest applied result.
    pub fn current(&self) -> CurrentRender {
        self.inner.results.borrow().clone()
    }

    /// Returns the stamp of the most recently issued render (0 before any).
    pub fn issued_seq(&self) -> u64 {
        self.inner.lock().issued
    }

    /// Returns the text waiting for the debounce timer, if any.
    pub fn pending_source(&self) -> Option<String> {
        self.inner
            .lock()
            .pending
            .as_ref()
            .map(|pending| pending.source.clone())
    }
}

impl<R> Drop for RenderScheduler<R> {
    fn drop(&mut self) {
        let mut fence = self.inner.fence.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = fence.pending.take() {
            pending.timer.abort();
        }
    }
}
