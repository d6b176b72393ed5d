use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use alist_models::LinkTarget;
use alist_preview::dom::{Container, HtmlContainer};
use alist_preview::html::escape;
use alist_preview::notice::LogNotifier;
use alist_preview::{markup, PreviewCategory, PreviewDispatcher, PreviewPipeline, PreviewSurface};
use alist_sdk::{RemoteFileResolver, SessionManager};
use anyhow::{bail, Context, Result};
use chrono::Utc;

pub async fn test_connection(session: &SessionManager) -> Result<()> {
    let record = alist_preview::test_connection(session, &LogNotifier).await?;
    println!(
        "Connection successful, token valid until {}",
        record.expires_at.to_rfc3339()
    );
    Ok(())
}

pub async fn status(session: &SessionManager) -> Result<()> {
    let credentials = session.credentials()?;
    let or_unset = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };
    println!("server:   {}", or_unset(credentials.base_url()));
    println!("username: {}", or_unset(&credentials.username));
    println!(
        "password: {}",
        if credentials.password.is_empty() { "(not set)" } else { "(set)" }
    );

    let Some(record) = session.current_record() else {
        println!("token:    none");
        return Ok(());
    };
    let buffer = session.policy().refresh_buffer;
    match record.remaining_at(Utc::now(), buffer) {
        Some(left) => println!(
            "token:    valid for {}h{:02}m (expires {})",
            left.num_hours(),
            left.num_minutes() % 60,
            record.expires_at.to_rfc3339()
        ),
        None => println!("token:    stale (expired {})", record.expires_at.to_rfc3339()),
    }
    let accepted = session.verify_token().await;
    println!("check:    token {}", if accepted { "accepted" } else { "rejected" });
    Ok(())
}

/// Accept either an `alist://` link or a plain absolute path.
fn remote_path(href: &str) -> Result<String> {
    if let Some(target) = LinkTarget::parse(href) {
        return Ok(target.decode_path()?);
    }
    if href.starts_with('/') {
        return Ok(href.to_string());
    }
    bail!("expected an alist:// link or an absolute path, got {href:?}")
}

pub async fn resolve(session: Arc<SessionManager>, href: &str) -> Result<()> {
    let path = remote_path(href)?;
    let file = RemoteFileResolver::new(session).resolve(&path).await?;
    println!("{}", serde_json::to_string_pretty(&file)?);
    println!("preview: {}", PreviewCategory::of(&file));
    Ok(())
}

/// Keeps the single container a CLI preview renders into.
#[derive(Default)]
struct PageSurface {
    opened: Mutex<Option<(String, HtmlContainer)>>,
}

impl PreviewSurface for PageSurface {
    fn open(&self, title: &str) -> Arc<dyn Container> {
        let container = HtmlContainer::new();
        *self.opened.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((title.to_string(), container.clone()));
        Arc::new(container)
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<h1>{}</h1>\n{body}\n</body>\n</html>\n",
        escape(title),
        escape(title),
    )
}

pub async fn preview(
    session: Arc<SessionManager>,
    href: &str,
    title: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let href = match LinkTarget::parse(href) {
        Some(_) => href.to_string(),
        None => LinkTarget::for_path(&remote_path(href)?).to_href(),
    };

    let resolver = RemoteFileResolver::new(session);
    let surface = Arc::new(PageSurface::default());
    let pipeline = PreviewPipeline::new(
        resolver.clone(),
        PreviewDispatcher::new(resolver),
        surface.clone(),
        Arc::new(LogNotifier),
    );

    let opened = pipeline.open_link(&href, title.unwrap_or_default()).await?;
    opened.outcome.finished().await;

    let Some((title, container)) = surface
        .opened
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
    else {
        bail!("no preview was opened for {href}");
    };
    let html = page(&title, &container.html());

    match out {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "wrote {} preview of {} to {}",
                PreviewCategory::of(&opened.file),
                opened.file.path,
                path.display()
            );
        }
        None => print!("{html}"),
    }
    Ok(())
}

pub fn logout(session: &SessionManager) -> Result<()> {
    session.clear()?;
    println!("Logged out");
    Ok(())
}

pub fn render_markdown(file: &Path) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    println!("{}", markup::render(&text));
    Ok(())
}
