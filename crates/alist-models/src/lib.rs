#![deny(missing_docs)]

//! # AList Models
//!
//! Core data types for previewing AList-hosted files from inside an
//! editing host.
//!
//! ## Pipeline
//!
//! ```text
//! click ── LinkTarget ──► decoded path
//!                           │
//!             Credentials ──┼──► TokenRecord (login / refresh)
//!                           ▼
//!                  RemoteFileDescriptor ──► preview
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credentials`] | User-supplied server URL, username and password |
//! | [`token`] | Persisted bearer token and its expiry arithmetic |
//! | [`link`] | The `alist://` scheme and path encoding |
//! | [`file`] | Resolved file metadata |
//! | [`api`] | Wire DTOs for the AList HTTP API |

pub mod api;
pub mod credentials;
pub mod error;
pub mod file;
pub mod link;
pub mod token;

// Re-export all public types at crate root for convenience.
pub use api::*;
pub use credentials::*;
pub use error::*;
pub use file::*;
pub use link::*;
pub use token::*;
