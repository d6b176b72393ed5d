//! # AList SDK
//!
//! Session management and file resolution against an **AList** server.
//!
//! The SDK provides:
//!
//! * [`SessionManager`]: persisted token with expiry-aware, serialized
//!   refresh.
//! * [`RemoteFileResolver`]: remote path → [`RemoteFileDescriptor`].
//! * [`AListClient`]: one-call-per-endpoint HTTP wrapper.
//! * [`ApiRoutes`]: canonical endpoint URLs.
//! * [`TokenStore`], [`FileTokenStore`], [`MemoryTokenStore`]: token
//!   persistence.
//! * [`Settings`], [`SettingsStore`]: user configuration and credential
//!   lookup.
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use alist_sdk::{FileTokenStore, RemoteFileResolver, SessionManager, SettingsStore};
//!
//! # async fn run() -> Result<(), alist_sdk::SdkError> {
//! let session = Arc::new(SessionManager::new(
//!     Arc::new(SettingsStore::default_location()?),
//!     Arc::new(FileTokenStore::default_location()?),
//! )?);
//!
//! let resolver = RemoteFileResolver::new(session);
//! let file = resolver.resolve("/test/file.txt").await?;
//! println!("{} ({} bytes) at {}", file.name, file.size, file.raw_url);
//! # Ok(())
//! # }
//! ```
//!
//! [`RemoteFileDescriptor`]: alist_models::RemoteFileDescriptor

pub mod client;
pub mod error;
pub mod resolver;
pub mod routes;
pub mod session;
pub mod settings;
pub mod store;

pub use client::{AListClient, ClientConfig, TextContent};
pub use error::SdkError;
pub use resolver::RemoteFileResolver;
pub use routes::ApiRoutes;
pub use session::{SessionManager, SessionPolicy};
pub use settings::{CredentialProvider, Settings, SettingsStore, DEFAULT_SERVER_URL};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

// Re-export the data model for ergonomic usage.
pub use alist_models::{Credentials, LinkTarget, RemoteFileDescriptor, TokenRecord};
