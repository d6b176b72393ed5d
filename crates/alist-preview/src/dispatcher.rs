//! File classification and type-specific preview rendering.

use std::sync::Arc;

use alist_models::RemoteFileDescriptor;
use alist_sdk::{RemoteFileResolver, TextContent};
use strum::IntoEnumIterator;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dom::Container;
use crate::html::escape;
use crate::markup;

/// Office Online embed viewer; the percent-encoded file URL is appended.
pub const DEFAULT_OFFICE_VIEWER_URL: &str = "https://view.officeapps.live.com/op/embed.aspx?src=";

/// Text previews larger than this are cut off; the remainder is never
/// downloaded.
pub const DEFAULT_MAX_TEXT_BYTES: usize = 1024 * 1024;

/// How a file is previewed. Variants are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum PreviewCategory {
    /// Shown in an `<img>`.
    Image,
    /// Shown in a `<video>` player.
    Video,
    /// Shown in an `<audio>` player.
    Audio,
    /// Embedded in an `<iframe>`.
    Pdf,
    /// Embedded through the office viewer.
    OfficeDocument,
    /// Fetched and shown as text, or rendered when markdown.
    TextOrMarkdown,
    /// Download link only.
    Unsupported,
}

impl PreviewCategory {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico"],
            Self::Video => &["mp4", "webm", "ogg", "mov", "avi", "mkv", "flv", "wmv", "m4v"],
            Self::Audio => &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"],
            Self::Pdf => &["pdf"],
            Self::OfficeDocument => &["doc", "docx", "xls", "xlsx", "ppt", "pptx"],
            Self::TextOrMarkdown => &[
                "txt", "md", "markdown", "json", "js", "ts", "css", "html", "xml", "yaml",
                "yml", "log", "ini", "conf", "py", "java", "c", "cpp", "h", "go", "rs", "sh",
            ],
            Self::Unsupported => &[],
        }
    }

    /// Classify by file name extension, case-insensitively. First match
    /// wins, so `.ogg` is a video.
    ///
    /// ```
    /// use alist_preview::PreviewCategory;
    ///
    /// assert_eq!(PreviewCategory::classify("photo.PNG"), PreviewCategory::Image);
    /// assert_eq!(PreviewCategory::classify("archive.zip"), PreviewCategory::Unsupported);
    /// ```
    pub fn classify(filename: &str) -> Self {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::Unsupported;
        };
        Self::iter()
            .find(|category| {
                category
                    .extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(Self::Unsupported)
    }

    /// Category of a resolved file. Directories are never previewed.
    pub fn of(file: &RemoteFileDescriptor) -> Self {
        if file.is_directory {
            Self::Unsupported
        } else {
            Self::classify(&file.name)
        }
    }
}

fn is_markdown(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
    })
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Prefix of the office embed viewer URL.
    pub office_viewer_url: String,
    /// Text previews are truncated to this many bytes.
    pub max_text_bytes: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            office_viewer_url: DEFAULT_OFFICE_VIEWER_URL.to_string(),
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }
}

/// Result of [`PreviewDispatcher::render`].
#[derive(Debug)]
pub enum RenderOutcome {
    /// The container holds the final preview.
    Done(PreviewCategory),
    /// A placeholder is shown; the task replaces it once content arrives.
    Pending(JoinHandle<()>),
}

impl RenderOutcome {
    /// Wait until the container holds its final content.
    pub async fn finished(self) {
        if let Self::Pending(task) = self {
            if let Err(e) = task.await {
                warn!(error = %e, "text preview task did not complete");
            }
        }
    }
}

/// Renders resolved files into host containers.
#[derive(Clone)]
pub struct PreviewDispatcher {
    resolver: RemoteFileResolver,
    config: PreviewConfig,
}

impl PreviewDispatcher {
    /// Fetch text content through `resolver` (same session and server).
    pub fn new(resolver: RemoteFileResolver) -> Self {
        Self {
            resolver,
            config: PreviewConfig::default(),
        }
    }

    /// Replace the default [`PreviewConfig`].
    #[must_use]
    pub fn with_config(mut self, config: PreviewConfig) -> Self {
        self.config = config;
        self
    }

    /// Settings in effect.
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Render `file` into `container`.
    ///
    /// Everything except text is rendered synchronously. Text shows a
    /// placeholder and continues on a spawned task; a failing fetch
    /// degrades to a download link inside the container.
    pub fn render(&self, file: &RemoteFileDescriptor, container: Arc<dyn Container>) -> RenderOutcome {
        let category = PreviewCategory::of(file);
        info!(path = %file.path, %category, "rendering preview");

        if !container.is_attached() {
            debug!(path = %file.path, "container detached before rendering");
            return RenderOutcome::Done(category);
        }

        let html = match category {
            PreviewCategory::Image => image_html(file),
            PreviewCategory::Video => media_html("video", file),
            PreviewCategory::Audio => media_html("audio", file),
            PreviewCategory::Pdf => frame_html(file, &file.raw_url),
            PreviewCategory::OfficeDocument => {
                let viewer = format!(
                    "{}{}",
                    self.config.office_viewer_url,
                    urlencoding::encode(&file.raw_url)
                );
                frame_html(file, &viewer)
            }
            PreviewCategory::Unsupported => unsupported_html(file),
            PreviewCategory::TextOrMarkdown => {
                container.set_html(&loading_html(file));
                return self.spawn_text(file.clone(), container);
            }
        };
        container.set_html(&html);
        RenderOutcome::Done(category)
    }

    fn spawn_text(&self, file: RemoteFileDescriptor, container: Arc<dyn Container>) -> RenderOutcome {
        let Ok(runtime) = Handle::try_current() else {
            warn!(path = %file.path, "no async runtime, showing download link instead");
            container.set_html(&fallback_html(&file));
            return RenderOutcome::Done(PreviewCategory::TextOrMarkdown);
        };
        let resolver = self.resolver.clone();
        let max_bytes = self.config.max_text_bytes;
        RenderOutcome::Pending(runtime.spawn(async move {
            let html = match resolver.fetch_text(&file.raw_url, max_bytes).await {
                Ok(content) => text_html(&file, &content),
                Err(e) => {
                    warn!(path = %file.path, error = %e, "text preview failed");
                    fallback_html(&file)
                }
            };
            if container.is_attached() {
                container.set_html(&html);
            } else {
                debug!(path = %file.path, "container closed while loading, dropping preview");
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// HTML fragments
// ---------------------------------------------------------------------------

fn download_link(file: &RemoteFileDescriptor) -> String {
    format!(
        "<a class=\"alist-preview-download\" href=\"{}\" download=\"{}\" target=\"_blank\" rel=\"noopener\">Download {}</a>",
        escape(&file.raw_url),
        escape(&file.name),
        escape(&file.name),
    )
}

fn image_html(file: &RemoteFileDescriptor) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-image\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></div>",
        escape(&file.raw_url),
        escape(&file.name),
    )
}

fn media_html(tag: &str, file: &RemoteFileDescriptor) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-{tag}\"><{tag} src=\"{}\" controls preload=\"metadata\">{}</{tag}></div>",
        escape(&file.raw_url),
        download_link(file),
    )
}

fn frame_html(file: &RemoteFileDescriptor, src: &str) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-document\"><iframe src=\"{}\" title=\"{}\" loading=\"lazy\"></iframe><p>{}</p></div>",
        escape(src),
        escape(&file.name),
        download_link(file),
    )
}

fn unsupported_html(file: &RemoteFileDescriptor) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-unsupported\"><p>No preview available for {}.</p><p>{}</p></div>",
        escape(&file.name),
        download_link(file),
    )
}

fn loading_html(file: &RemoteFileDescriptor) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-loading\">Loading {}…</div>",
        escape(&file.name)
    )
}

fn fallback_html(file: &RemoteFileDescriptor) -> String {
    format!(
        "<div class=\"alist-preview alist-preview-error\"><p>Could not load the content of {}.</p><p>{}</p></div>",
        escape(&file.name),
        download_link(file),
    )
}

fn text_html(file: &RemoteFileDescriptor, content: &TextContent) -> String {
    let shown = content.text.as_str();
    let body = if is_markdown(&file.name) {
        format!(
            "<div class=\"alist-preview alist-preview-markdown\">{}</div>",
            markup::render(shown)
        )
    } else {
        format!(
            "<pre class=\"alist-preview alist-preview-text\">{}</pre>",
            escape(shown)
        )
    };
    if content.truncated {
        format!(
            "{body}<p class=\"alist-preview-truncated\">Showing the first {} of {} bytes. {}</p>",
            shown.len(),
            content.total_bytes.unwrap_or(file.size),
            download_link(file),
        )
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlContainer;

    fn file(name: &str) -> RemoteFileDescriptor {
        RemoteFileDescriptor {
            path: format!("/test/{name}"),
            name: name.to_string(),
            size: 10,
            is_directory: false,
            modified_at: "2024-05-01T10:00:00Z".to_string(),
            raw_url: format!("http://alist.local/d/test/{name}"),
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(PreviewCategory::classify("photo.PNG"), PreviewCategory::Image);
        assert_eq!(PreviewCategory::classify("clip.Mp4"), PreviewCategory::Video);
        assert_eq!(PreviewCategory::classify("song.FLAC"), PreviewCategory::Audio);
        assert_eq!(PreviewCategory::classify("paper.pdf"), PreviewCategory::Pdf);
        assert_eq!(
            PreviewCategory::classify("sheet.XLSX"),
            PreviewCategory::OfficeDocument
        );
        assert_eq!(
            PreviewCategory::classify("notes.md"),
            PreviewCategory::TextOrMarkdown
        );
    }

    #[test]
    fn first_matching_category_wins() {
        assert_eq!(PreviewCategory::classify("sound.ogg"), PreviewCategory::Video);
    }

    #[test]
    fn unknown_or_missing_extension_is_unsupported() {
        assert_eq!(
            PreviewCategory::classify("archive.zip"),
            PreviewCategory::Unsupported
        );
        assert_eq!(PreviewCategory::classify("Makefile"), PreviewCategory::Unsupported);
        assert_eq!(PreviewCategory::classify("trailing."), PreviewCategory::Unsupported);
        assert_eq!(PreviewCategory::classify("png"), PreviewCategory::Unsupported);
    }

    #[test]
    fn directories_are_unsupported() {
        let mut dir = file("images.png");
        dir.is_directory = true;
        assert_eq!(PreviewCategory::of(&dir), PreviewCategory::Unsupported);
    }

    #[test]
    fn category_names() {
        assert_eq!(PreviewCategory::OfficeDocument.to_string(), "OfficeDocument");
    }

    #[test]
    fn fragments_escape_names() {
        let mut f = file("a\"b<c>.png");
        f.raw_url = "http://alist.local/d/a\"b".to_string();
        let html = image_html(&f);
        assert!(html.contains("alt=\"a&quot;b&lt;c&gt;.png\""));
        assert!(html.contains("src=\"http://alist.local/d/a&quot;b\""));
    }

    fn content(text: &str) -> TextContent {
        TextContent {
            text: text.to_string(),
            truncated: false,
            total_bytes: Some(text.len() as u64),
        }
    }

    fn dispatcher(config: PreviewConfig) -> PreviewDispatcher {
        let session = alist_sdk::SessionManager::new(
            Arc::new(alist_models::Credentials::new("http://alist.local", "admin", "secret")),
            Arc::new(alist_sdk::MemoryTokenStore::new()),
        )
        .unwrap();
        PreviewDispatcher::new(RemoteFileResolver::new(Arc::new(session))).with_config(config)
    }

    fn rendered(dispatcher: &PreviewDispatcher, f: &RemoteFileDescriptor) -> String {
        let container = HtmlContainer::new();
        let outcome = dispatcher.render(f, Arc::new(container.clone()));
        assert!(matches!(outcome, RenderOutcome::Done(_)));
        container.html()
    }

    #[test]
    fn video_gets_a_player_with_controls() {
        let html = rendered(&dispatcher(PreviewConfig::default()), &file("clip.mp4"));
        assert!(html.starts_with("<div class=\"alist-preview alist-preview-video\">"));
        assert!(html.contains(
            "<video src=\"http://alist.local/d/test/clip.mp4\" controls preload=\"metadata\">"
        ));
        assert!(html.contains("Download clip.mp4</a></video>"));
    }

    #[test]
    fn audio_gets_a_player() {
        let html = rendered(&dispatcher(PreviewConfig::default()), &file("song.mp3"));
        assert!(html.contains("alist-preview-audio"));
        assert!(html.contains("<audio src=\"http://alist.local/d/test/song.mp3\" controls"));
    }

    #[test]
    fn pdf_is_framed_directly() {
        let html = rendered(&dispatcher(PreviewConfig::default()), &file("paper.pdf"));
        assert!(html.contains("<iframe src=\"http://alist.local/d/test/paper.pdf\""));
    }

    #[test]
    fn office_documents_go_through_the_viewer() {
        let html = rendered(&dispatcher(PreviewConfig::default()), &file("report.docx"));
        assert!(html.contains(
            "<iframe src=\"https://view.officeapps.live.com/op/embed.aspx?src=http%3A%2F%2Falist.local%2Fd%2Ftest%2Freport.docx\""
        ));
        assert!(html.contains(
            "<a class=\"alist-preview-download\" href=\"http://alist.local/d/test/report.docx\""
        ));
    }

    #[test]
    fn configured_viewer_replaces_the_default() {
        let config = PreviewConfig {
            office_viewer_url: "https://office.example/view?u=".to_string(),
            ..PreviewConfig::default()
        };
        let d = dispatcher(config.clone());
        assert_eq!(d.config(), &config);
        let html = rendered(&d, &file("sheet.xlsx"));
        assert!(html.contains(
            "<iframe src=\"https://office.example/view?u=http%3A%2F%2Falist.local%2Fd%2Ftest%2Fsheet.xlsx\""
        ));
        assert!(!html.contains("officeapps"));
    }

    #[test]
    fn detached_container_is_left_alone() {
        let container = HtmlContainer::new();
        container.detach();
        let outcome =
            dispatcher(PreviewConfig::default()).render(&file("photo.png"), Arc::new(container.clone()));
        assert!(matches!(outcome, RenderOutcome::Done(PreviewCategory::Image)));
        assert_eq!(container.writes(), 0);
    }

    #[test]
    fn markdown_names_render_markup() {
        let html = text_html(&file("readme.MD"), &content("# Title"));
        assert!(html.contains("<h1>Title</h1>"));
        let plain = text_html(&file("notes.txt"), &content("# <b>"));
        assert_eq!(
            plain,
            "<pre class=\"alist-preview alist-preview-text\"># &lt;b&gt;</pre>"
        );
    }

    #[test]
    fn truncated_text_carries_a_note() {
        let partial = TextContent {
            text: "0123".to_string(),
            truncated: true,
            total_bytes: Some(10),
        };
        let html = text_html(&file("big.log"), &partial);
        assert!(html.contains(">0123</pre>"));
        assert!(html.contains("Showing the first 4 of 10 bytes."));
        assert!(html.contains("alist-preview-download"));
    }

    #[test]
    fn unannounced_length_falls_back_to_the_listed_size() {
        let partial = TextContent {
            text: "0123".to_string(),
            truncated: true,
            total_bytes: None,
        };
        let html = text_html(&file("big.log"), &partial);
        assert!(html.contains("Showing the first 4 of 10 bytes."));
    }
}
