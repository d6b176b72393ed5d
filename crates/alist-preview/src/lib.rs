#![deny(missing_docs)]
//! # AList preview
//!
//! Turns clicks on `alist://` links inside a host document into inline
//! previews of files stored on an AList server.
//!
//! * [`LinkInterceptor`]: capture-phase click handling and link
//!   extraction.
//! * [`PreviewPipeline`]: decode → resolve → open container → render.
//! * [`PreviewDispatcher`]: file classification and per-type HTML.
//! * [`markup`]: minimal markdown renderer for `.md` files.
//! * [`dom`]: the traits a host implements ([`Element`], [`ClickSource`],
//!   [`Container`]) and in-memory versions of them.
//! * [`notice`]: short user notices.
//! * [`connection`]: the "test connection" flow.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use alist_preview::dom::{Container, Document, HtmlContainer};
//! use alist_preview::notice::LogNotifier;
//! use alist_preview::{LinkInterceptor, PreviewDispatcher, PreviewPipeline, PreviewSurface};
//! use alist_sdk::{FileTokenStore, RemoteFileResolver, SessionManager, SettingsStore};
//!
//! struct Panel(HtmlContainer);
//!
//! impl PreviewSurface for Panel {
//!     fn open(&self, _title: &str) -> Arc<dyn Container> {
//!         Arc::new(self.0.clone())
//!     }
//! }
//!
//! # async fn run() -> Result<(), alist_sdk::SdkError> {
//! let session = Arc::new(SessionManager::new(
//!     Arc::new(SettingsStore::default_location()?),
//!     Arc::new(FileTokenStore::default_location()?),
//! )?);
//! let resolver = RemoteFileResolver::new(session);
//! let pipeline = PreviewPipeline::new(
//!     resolver.clone(),
//!     PreviewDispatcher::new(resolver),
//!     Arc::new(Panel(HtmlContainer::new())),
//!     Arc::new(LogNotifier),
//! );
//!
//! let document = Arc::new(Document::new());
//! let interceptor = LinkInterceptor::new(document, pipeline, tokio::runtime::Handle::current());
//! interceptor.start();
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod dispatcher;
pub mod dom;
pub mod html;
pub mod interceptor;
pub mod markup;
pub mod notice;

pub use connection::test_connection;
pub use dispatcher::{PreviewCategory, PreviewConfig, PreviewDispatcher, RenderOutcome};
pub use dom::{ClickEvent, ClickSource, Container, Element};
pub use interceptor::{
    default_strategies, extract_link, ExtractStrategy, ExtractedLink, LinkInterceptor,
    OpenedPreview, PreviewPipeline, PreviewSurface,
};
pub use notice::{Notice, NoticeLevel, Notifier};
