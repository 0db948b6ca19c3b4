//! Share tokens for Mural diagram sources.
//!
//! A share token is a compact, versioned, URL-safe encoding of a diagram's
//! source text, designed to live in the fragment of a page address:
//!
//! ```text
//! token     := "v1." algorithm "." payload
//! algorithm := "d"
//! payload   := base64url-no-pad(deflate(utf8(source)))
//! ```
//!
//! Both the version and the algorithm are explicit so future formats can
//! coexist with existing links. Tokens without any `v<N>.` prefix are decoded
//! as legacy untagged payloads.
//!
//! # Overview
//!
//! - [`ShareCodec`] - Encodes and decodes tokens using a selected compression backend.
//! - [`backend`] - The [`DeflateBackend`](backend::DeflateBackend) strategy and its
//!   streaming and in-process implementations.
//! - [`location`] - Reading and writing the `diagram` parameter of a URL.
//!
//! # Example
//!
//! ```
//! # use mural_codec::ShareCodec;
//! let codec = ShareCodec::default();
//!
//! let token = codec.encode("graph TD; A-->B").unwrap();
//! assert!(token.starts_with("v1.d."));
//! assert_eq!(codec.decode(&token).unwrap(), "graph TD; A-->B");
//! ```

pub mod backend;
pub mod location;

mod error;
mod token;

pub use error::CodecError;
pub use token::{DEFAULT_MAX_DECODED_LEN, ShareCodec, TOKEN_PREFIX};
