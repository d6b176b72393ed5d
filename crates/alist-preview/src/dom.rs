//! Host document abstraction.
//!
//! The preview core never talks to a concrete UI toolkit. It sees the
//! host through three small traits:
//!
//! * [`Element`]: read-only view of a node (tag, attributes, parent, text).
//! * [`ClickSource`]: a capture-phase click observer that listeners can be
//!   registered on and removed from.
//! * [`Container`]: a region the preview is rendered into.
//!
//! [`Document`] and [`HtmlContainer`] are in-memory implementations used by
//! the CLI and the test-suite, and by hosts that render headlessly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A node of the host document.
pub trait Element: Clone + Send + Sync + 'static {
    /// Lower-case tag name (`"a"`, `"span"`, …).
    fn tag_name(&self) -> String;

    /// Attribute value, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// The parent element, `None` at the root.
    fn parent_element(&self) -> Option<Self>;

    /// Concatenated text of this node and its descendants.
    fn text_content(&self) -> String;

    /// Nearest strict ancestor matching `predicate`.
    fn find_ancestor(&self, predicate: impl Fn(&Self) -> bool) -> Option<Self> {
        let mut current = self.parent_element();
        while let Some(element) = current {
            if predicate(&element) {
                return Some(element);
            }
            current = element.parent_element();
        }
        None
    }
}

/// A click as seen by a capture-phase listener.
#[derive(Debug, Clone)]
pub struct ClickEvent<E> {
    target: E,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl<E> ClickEvent<E> {
    /// A fresh, unsuppressed click on `target`.
    pub fn new(target: E) -> Self {
        Self {
            target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// The element that was clicked.
    pub fn target(&self) -> &E {
        &self.target
    }

    /// Cancel the host's default action (navigation).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Keep every remaining listener from seeing this event.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// A listener called [`prevent_default`](Self::prevent_default).
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// A listener called
    /// [`stop_immediate_propagation`](Self::stop_immediate_propagation).
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Listener callback registered on a [`ClickSource`].
pub type ClickListener<E> = Arc<dyn Fn(&mut ClickEvent<E>) + Send + Sync>;

/// Registration handle returned by [`ClickSource::add_capture_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Host-wide capture-phase click observer.
pub trait ClickSource: Send + Sync + 'static {
    /// Element type the source dispatches.
    type Element: Element;

    /// Register `listener` ahead of the host's own handlers.
    fn add_capture_listener(&self, listener: ClickListener<Self::Element>) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}

/// A region of the host surface that a preview renders into.
pub trait Container: Send + Sync {
    /// Replace the container's content.
    fn set_html(&self, html: &str);

    /// `false` once the host has closed or removed the container.
    fn is_attached(&self) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory document
// ---------------------------------------------------------------------------

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct DocumentInner {
    nodes: RwLock<Vec<Node>>,
    listeners: Mutex<Vec<(ListenerId, ClickListener<ElementRef>)>>,
    next_listener: AtomicU64,
    navigations: Mutex<Vec<String>>,
}

/// Minimal element tree with click dispatch.
///
/// Clicks run every capture listener in registration order until one stops
/// propagation. Unless a listener prevented the default action, the
/// `href` of the nearest anchor is recorded as a host navigation.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a `<body>` root.
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            inner: Arc::new(DocumentInner {
                nodes: RwLock::new(vec![body]),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                navigations: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The root node.
    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element under `parent` and return its id.
    pub fn append(
        &self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let mut nodes = self
            .inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let id = NodeId(nodes.len());
        nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            text: text.to_string(),
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = nodes.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    /// Handle to the element `id`.
    pub fn element(&self, id: NodeId) -> ElementRef {
        ElementRef {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    /// Dispatch a click on `target` and return the event as the last
    /// listener left it.
    pub fn click(&self, target: NodeId) -> ClickEvent<ElementRef> {
        let element = self.element(target);
        let mut event = ClickEvent::new(element.clone());

        // Snapshot so listeners may (de)register while the click runs.
        let listeners: Vec<_> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&mut event);
            if event.is_propagation_stopped() {
                break;
            }
        }

        if !event.is_default_prevented() {
            let href = element
                .attribute("href")
                .filter(|_| element.tag_name() == "a")
                .or_else(|| {
                    element
                        .find_ancestor(|e| e.tag_name() == "a" && e.attribute("href").is_some())
                        .and_then(|a| a.attribute("href"))
                });
            if let Some(href) = href {
                debug!(href = %href, "host navigation");
                lock(&self.inner.navigations).push(href);
            }
        }
        event
    }

    /// Hrefs the host navigated to because nobody suppressed the click.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.inner.navigations).clone()
    }

    /// Number of registered click listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

impl ClickSource for Document {
    type Element = ElementRef;

    fn add_capture_listener(&self, listener: ClickListener<ElementRef>) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        lock(&self.inner.listeners).retain(|(registered, _)| *registered != id);
    }
}

/// A node of a [`Document`].
#[derive(Clone)]
pub struct ElementRef {
    inner: Arc<DocumentInner>,
    id: NodeId,
}

impl ElementRef {
    /// Id of the node inside its document.
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn with_node<T>(&self, f: impl FnOnce(&Node) -> T) -> Option<T> {
        let nodes = self
            .inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        nodes.get(self.id.0).map(f)
    }
}

impl std::fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("tag", &self.tag_name())
            .finish()
    }
}

impl Element for ElementRef {
    fn tag_name(&self) -> String {
        self.with_node(|n| n.tag.clone()).unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.with_node(|n| {
            n.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
        .flatten()
    }

    fn parent_element(&self) -> Option<Self> {
        self.with_node(|n| n.parent).flatten().map(|id| Self {
            inner: Arc::clone(&self.inner),
            id,
        })
    }

    fn text_content(&self) -> String {
        let nodes = self
            .inner
            .nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut out = String::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            if let Some(node) = nodes.get(id.0) {
                out.push_str(&node.text);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// In-memory container
// ---------------------------------------------------------------------------

/// A [`Container`] that keeps its HTML in memory.
///
/// Clones share the same content and attachment flag.
#[derive(Debug, Clone)]
pub struct HtmlContainer {
    html: Arc<Mutex<String>>,
    attached: Arc<AtomicBool>,
    writes: Arc<AtomicU64>,
}

impl Default for HtmlContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlContainer {
    /// An empty, attached container.
    pub fn new() -> Self {
        Self {
            html: Arc::new(Mutex::new(String::new())),
            attached: Arc::new(AtomicBool::new(true)),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current content.
    pub fn html(&self) -> String {
        lock(&self.html).clone()
    }

    /// Simulate the host closing the container.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Number of `set_html` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Container for HtmlContainer {
    fn set_html(&self, html: &str) {
        *lock(&self.html) = html.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn text_content_walks_descendants_in_order() {
        let doc = Document::new();
        let a = doc.append(doc.body(), "a", &[("href", "x")], "Open ");
        doc.append(a, "b", &[], "the");
        doc.append(a, "span", &[], " file");
        assert_eq!(doc.element(a).text_content(), "Open the file");
    }

    #[test]
    fn find_ancestor_skips_self() {
        let doc = Document::new();
        let outer = doc.append(doc.body(), "div", &[("data-href", "outer")], "");
        let inner = doc.append(outer, "div", &[("data-href", "inner")], "");
        let found = doc
            .element(inner)
            .find_ancestor(|e| e.attribute("data-href").is_some())
            .unwrap();
        assert_eq!(found.id(), outer);
    }

    #[test]
    fn unsuppressed_click_navigates() {
        let doc = Document::new();
        let a = doc.append(doc.body(), "A", &[("href", "https://example.com")], "");
        let span = doc.append(a, "span", &[], "go");
        doc.click(span);
        assert_eq!(doc.navigations(), vec!["https://example.com".to_string()]);
    }

    #[test]
    fn stopped_propagation_skips_later_listeners() {
        let doc = Document::new();
        let seen = Arc::new(AtomicUsize::new(0));
        doc.add_capture_listener(Arc::new(|event: &mut ClickEvent<ElementRef>| {
            event.prevent_default();
            event.stop_immediate_propagation();
        }));
        let counter = Arc::clone(&seen);
        doc.add_capture_listener(Arc::new(move |_: &mut ClickEvent<ElementRef>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let a = doc.append(doc.body(), "a", &[("href", "x")], "");
        let event = doc.click(a);
        assert!(event.is_default_prevented());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(doc.navigations().is_empty());
    }

    #[test]
    fn removed_listener_is_not_called() {
        let doc = Document::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let id = doc.add_capture_listener(Arc::new(move |_: &mut ClickEvent<ElementRef>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        doc.remove_listener(id);
        doc.click(doc.body());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn container_tracks_writes_and_detach() {
        let container = HtmlContainer::new();
        container.set_html("<p>x</p>");
        assert_eq!(container.html(), "<p>x</p>");
        assert_eq!(container.writes(), 1);
        assert!(container.is_attached());
        container.clone().detach();
        assert!(!container.is_attached());
    }
}
