//! Standalone mock AList server for manual runs of the CLI.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MOCK_ALIST_PORT` | `5244` | HTTP listen port |
//! | `MOCK_ALIST_USERNAME` | `admin` | Accepted username |
//! | `MOCK_ALIST_PASSWORD` | `admin` | Accepted password |

use mock_alist::{MockAList, MockFile};
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("MOCK_ALIST_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5244);
    let username = std::env::var("MOCK_ALIST_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("MOCK_ALIST_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    let mock = MockAList::new(&username, &password)
        .with_file("/test", MockFile::dir())
        .with_file("/test/file.txt", MockFile::text("Hello from the mock AList server.\n"))
        .with_file(
            "/test/readme.md",
            MockFile::text("# Readme\n\nSome **bold** text and `inline code`.\n\n- one\n- two\n"),
        )
        .with_file("/test/photo.png", MockFile::text("not really a png").without_raw_url())
        .with_file("/test/report.pdf", MockFile::text("%PDF-1.4"));

    let server = mock.spawn_on(&format!("127.0.0.1:{port}")).await?;
    info!(url = %server.url(), username = %username, "mock AList ready");
    server.wait().await;
    Ok(())
}
