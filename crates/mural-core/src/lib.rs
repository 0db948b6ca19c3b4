//! Mural Core Types and Definitions
//!
//! This crate provides the foundational types shared by every part of a
//! Mural editing session. It includes:
//!
//! - **Geometry**: Points and sizes in screen and content space ([`geometry`] module)
//! - **Artifacts**: Render styles, render results and export planning ([`artifact`] module)
//! - **Viewport**: Anchor-preserving zoom and drag-pan over a rendered surface
//!   ([`viewport`] module)

pub mod artifact;
pub mod geometry;
pub mod viewport;
