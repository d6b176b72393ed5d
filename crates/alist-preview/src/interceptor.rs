//! `alist://` link interception.
//!
//! [`LinkInterceptor`] owns one capture-phase listener on the host's
//! [`ClickSource`]. For every click it runs an ordered list of extraction
//! strategies to find a link on the clicked element or its ancestors. A
//! link carrying the `alist://` scheme is suppressed synchronously; the
//! rest of the work (decode, resolve, open a container, render) continues
//! on a spawned task and ends in a preview or a notice, never in a panic.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alist_models::{LinkTarget, RemoteFileDescriptor};
use alist_sdk::{RemoteFileResolver, SdkError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatcher::{PreviewDispatcher, RenderOutcome};
use crate::dom::{ClickEvent, ClickSource, Container, Element, ListenerId};
use crate::notice::{Notice, Notifier, TRANSIENT};

/// Attribute some hosts put on non-anchor elements that act as links.
pub const DATA_HREF: &str = "data-href";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Extraction strategies
// ---------------------------------------------------------------------------

/// A link found on (or above) a clicked element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Raw `href` or `data-href` value, not yet validated.
    pub href: String,
    /// Visible text, used as the preview title.
    pub text: String,
}

/// Looks for a link starting from the clicked element.
pub type ExtractStrategy<E> = fn(&E) -> Option<ExtractedLink>;

fn is_anchor<E: Element>(element: &E) -> bool {
    element.tag_name() == "a" && element.attribute("href").is_some_and(|h| !h.is_empty())
}

fn has_data_href<E: Element>(element: &E) -> bool {
    element
        .attribute(DATA_HREF)
        .is_some_and(|h| !h.is_empty())
}

fn link_from<E: Element>(element: &E, attribute: &str) -> Option<ExtractedLink> {
    element
        .attribute(attribute)
        .filter(|href| !href.is_empty())
        .map(|href| ExtractedLink {
            href,
            text: element.text_content().trim().to_string(),
        })
}

/// The clicked element is an `<a href>`.
pub fn anchor_href<E: Element>(element: &E) -> Option<ExtractedLink> {
    if is_anchor(element) {
        link_from(element, "href")
    } else {
        None
    }
}

/// The nearest ancestor `<a href>`.
pub fn ancestor_anchor_href<E: Element>(element: &E) -> Option<ExtractedLink> {
    element
        .find_ancestor(is_anchor::<E>)
        .and_then(|anchor| link_from(&anchor, "href"))
}

/// The clicked element carries `data-href`.
pub fn data_href<E: Element>(element: &E) -> Option<ExtractedLink> {
    link_from(element, DATA_HREF)
}

/// The nearest ancestor carrying `data-href`.
pub fn ancestor_data_href<E: Element>(element: &E) -> Option<ExtractedLink> {
    element
        .find_ancestor(has_data_href::<E>)
        .and_then(|holder| link_from(&holder, DATA_HREF))
}

/// Strategies in the order they are tried.
pub fn default_strategies<E: Element>() -> Vec<ExtractStrategy<E>> {
    vec![
        anchor_href::<E> as ExtractStrategy<E>,
        ancestor_anchor_href::<E> as ExtractStrategy<E>,
        data_href::<E> as ExtractStrategy<E>,
        ancestor_data_href::<E> as ExtractStrategy<E>,
    ]
}

/// First link any strategy finds.
pub fn extract_link<E: Element>(
    element: &E,
    strategies: &[ExtractStrategy<E>],
) -> Option<ExtractedLink> {
    strategies.iter().find_map(|strategy| strategy(element))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Host surface that opens preview containers (a dialog, a side panel, …).
pub trait PreviewSurface: Send + Sync {
    /// Open an empty container titled `title`.
    fn open(&self, title: &str) -> Arc<dyn Container>;
}

/// A preview that has been opened for a link.
#[derive(Debug)]
pub struct OpenedPreview {
    /// The resolved file.
    pub file: RemoteFileDescriptor,
    /// Whether the container is final or still loading.
    pub outcome: RenderOutcome,
}

/// Decode → resolve → open → render, shared by clicks and direct calls.
pub struct PreviewPipeline {
    resolver: RemoteFileResolver,
    dispatcher: PreviewDispatcher,
    surface: Arc<dyn PreviewSurface>,
    notifier: Arc<dyn Notifier>,
}

impl PreviewPipeline {
    /// Wire the pipeline to a resolver, a dispatcher and the host's
    /// preview surface and notice area.
    pub fn new(
        resolver: RemoteFileResolver,
        dispatcher: PreviewDispatcher,
        surface: Arc<dyn PreviewSurface>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            dispatcher,
            surface,
            notifier,
        }
    }

    /// Where user-visible notices go.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Open a preview for `href`.
    ///
    /// `title` is the link text; an empty title falls back to the file
    /// name. Returns once the container is open; text content may still
    /// be loading (see [`RenderOutcome::Pending`]).
    pub async fn open_link(&self, href: &str, title: &str) -> Result<OpenedPreview, SdkError> {
        let target = LinkTarget::parse(href)
            .ok_or_else(|| SdkError::Validation(format!("not an alist:// link: {href}")))?;
        let path = target.decode_path()?;
        debug!(path = %path, "link decoded");

        let file = self.resolver.resolve(&path).await?;
        let title = match title.trim() {
            "" => file.name.clone(),
            t => t.to_string(),
        };
        let container = self.surface.open(&title);
        let outcome = self.dispatcher.render(&file, container);
        Ok(OpenedPreview { file, outcome })
    }

    /// [`open_link`](Self::open_link), with failures turned into notices.
    async fn run(&self, href: &str, title: &str) {
        match self.open_link(href, title).await {
            Ok(opened) => opened.outcome.finished().await,
            Err(e) => {
                warn!(href = %href, error = %e, "preview aborted");
                self.notifier.notify(Notice::error(e.notice_text()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Interceptor
// ---------------------------------------------------------------------------

struct Shared<E> {
    pipeline: Arc<PreviewPipeline>,
    strategies: Vec<ExtractStrategy<E>>,
    runtime: Handle,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl<E: Element> Shared<E> {
    fn intercept(&self, event: &mut ClickEvent<E>) -> Option<JoinHandle<()>> {
        let link = extract_link(event.target(), &self.strategies)?;
        if !LinkTarget::matches(&link.href) {
            return None;
        }

        event.prevent_default();
        event.stop_immediate_propagation();
        info!(href = %link.href, "intercepted alist link");
        self.pipeline
            .notifier
            .notify(Notice::info("Loading preview…", TRANSIENT));

        let pipeline = Arc::clone(&self.pipeline);
        let handle = self.runtime.spawn(async move {
            pipeline.run(&link.href, &link.text).await;
        });

        lock(&self.in_flight).retain(|task| !task.is_finished());
        Some(handle)
    }
}

/// Capture-phase click handler for `alist://` links.
///
/// Dropping the interceptor removes its listener.
pub struct LinkInterceptor<S: ClickSource> {
    source: Arc<S>,
    shared: Arc<Shared<S::Element>>,
    registration: Mutex<Option<ListenerId>>,
}

impl<S: ClickSource> LinkInterceptor<S> {
    /// Interceptor on `source` that spawns its work on `runtime`.
    pub fn new(source: Arc<S>, pipeline: PreviewPipeline, runtime: Handle) -> Self {
        Self::with_strategies(source, pipeline, runtime, default_strategies())
    }

    /// Same as [`new`](Self::new) with a custom strategy list.
    pub fn with_strategies(
        source: Arc<S>,
        pipeline: PreviewPipeline,
        runtime: Handle,
        strategies: Vec<ExtractStrategy<S::Element>>,
    ) -> Self {
        Self {
            source,
            shared: Arc::new(Shared {
                pipeline: Arc::new(pipeline),
                strategies,
                runtime,
                in_flight: Mutex::new(Vec::new()),
            }),
            registration: Mutex::new(None),
        }
    }

    /// The pipeline clicks are handed to.
    pub fn pipeline(&self) -> &Arc<PreviewPipeline> {
        &self.shared.pipeline
    }

    /// Register the listener. Returns `false` if it already was.
    pub fn start(&self) -> bool {
        let mut registration = lock(&self.registration);
        if registration.is_some() {
            return false;
        }
        let shared = Arc::clone(&self.shared);
        let id = self
            .source
            .add_capture_listener(Arc::new(move |event: &mut ClickEvent<S::Element>| {
                if let Some(task) = shared.intercept(event) {
                    lock(&shared.in_flight).push(task);
                }
            }));
        *registration = Some(id);
        info!("link interceptor started");
        true
    }

    /// Remove the listener. Returns `false` if none was registered.
    pub fn stop(&self) -> bool {
        match lock(&self.registration).take() {
            Some(id) => {
                self.source.remove_listener(id);
                info!("link interceptor stopped");
                true
            }
            None => false,
        }
    }

    /// `true` while the listener is registered.
    pub fn is_running(&self) -> bool {
        lock(&self.registration).is_some()
    }

    /// Run the listener logic against `event` without going through the
    /// click source. Returns the spawned task if the click was taken.
    pub fn handle_click(&self, event: &mut ClickEvent<S::Element>) -> Option<JoinHandle<()>> {
        self.shared.intercept(event)
    }

    /// Open a preview for `href` directly, as if its link was clicked.
    pub async fn open_link(&self, href: &str, title: &str) -> Result<OpenedPreview, SdkError> {
        self.shared.pipeline.open_link(href, title).await
    }

    /// Wait for every preview started by a click to finish.
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<_> = lock(&self.shared.in_flight).drain(..).collect();
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "preview task did not complete");
                }
            }
        }
    }
}

impl<S: ClickSource> Drop for LinkInterceptor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
