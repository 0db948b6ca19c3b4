//! Mural - live diagram editing sessions.
//!
//! A [`Session`] owns the diagram source being edited and keeps three pieces
//! in step with it:
//!
//! - a [`RenderScheduler`] that debounces edits, calls the external
//!   [`Renderer`], and only ever applies the most recently issued render,
//! - a [`ViewportController`](mural_core::viewport::ViewportController) that
//!   fits, zooms and pans the rendered surface,
//! - a [`ShareCodec`](mural_codec::ShareCodec) that keeps the share link in the
//!   page address up to date.
//!
//! Rendering itself is external: implement [`Renderer`], or use the
//! [`CommandRenderer`](render::CommandRenderer) to run a renderer program.
//!
//! # Example
//!
//! ```rust,no_run
//! use mural::{Session, config::AppConfig, render::CommandRenderer};
//! use url::Url;
//!
//! # async fn demo() -> Result<(), mural::MuralError> {
//! let config = AppConfig::default();
//! let renderer = CommandRenderer::from_config(config.renderer())?;
//! let location = Url::parse("https://mural.dev/")?;
//!
//! let mut session = Session::open(renderer, &config, location);
//! session.edit("graph TD\n  A --> B\n");
//!
//! if let Some(update) = session.next_update().await {
//!     println!("render #{}: {:?}", update.seq(), update.result());
//!     println!("share: {}", update.location());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod preset;
pub mod render;
pub mod scheduler;
pub mod session;

mod error;

pub use mural_codec as codec;
pub use mural_core::{artifact, geometry, viewport};

pub use error::MuralError;
pub use render::{RenderError, RenderOutput, Renderer};
pub use scheduler::{AppliedRender, RenderRequest, RenderScheduler};
pub use session::{Session, SessionUpdate};
