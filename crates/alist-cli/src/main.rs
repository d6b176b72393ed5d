mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use alist_models::Credentials;
use alist_sdk::{
    CredentialProvider, FileTokenStore, SdkError, SessionManager, SettingsStore,
};
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "alist-preview")]
#[command(about = "Resolve and preview alist:// links from the command line")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Settings file (default: <config dir>/alist-preview/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// AList server URL, overrides the settings file
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Login name, overrides the settings file
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password, overrides the settings file
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with the configured credentials and report the result
    TestConnection,
    /// Show configuration and token state
    Status,
    /// Print the metadata of an alist:// link or absolute remote path
    Resolve {
        href: String,
    },
    /// Render the preview of an alist:// link as an HTML page
    Preview {
        href: String,
        /// Write the page here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Page title (default: the file name)
        #[arg(long)]
        title: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Render a local markdown file to HTML
    RenderMarkdown {
        file: PathBuf,
    },
}

/// Credentials from the settings file with command-line values on top.
#[derive(Debug, Clone)]
struct CliCredentials {
    settings: SettingsStore,
    server_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl CredentialProvider for CliCredentials {
    fn credentials(&self) -> Result<Credentials, SdkError> {
        let settings = self.settings.load()?.with_overrides(|key| match key {
            "ALIST_SERVER_URL" => self.server_url.clone(),
            "ALIST_USERNAME" => self.username.clone(),
            "ALIST_PASSWORD" => self.password.clone(),
            _ => None,
        });
        Ok(settings.credentials())
    }
}

impl Cli {
    fn session(&self) -> Result<SessionManager> {
        let (settings, tokens) = match &self.config {
            Some(path) => (
                SettingsStore::new(path),
                FileTokenStore::new(path.with_file_name("token.json")),
            ),
            None => (
                SettingsStore::default_location()?,
                FileTokenStore::default_location()?,
            ),
        };
        let credentials = CliCredentials {
            settings,
            server_url: self.server_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        };
        Ok(SessionManager::new(Arc::new(credentials), Arc::new(tokens))?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::TestConnection => commands::test_connection(&cli.session()?).await,
        Command::Status => commands::status(&cli.session()?).await,
        Command::Resolve { href } => commands::resolve(Arc::new(cli.session()?), href).await,
        Command::Preview { href, out, title } => {
            commands::preview(
                Arc::new(cli.session()?),
                href,
                title.as_deref(),
                out.as_deref(),
            )
            .await
        }
        Command::Logout => commands::logout(&cli.session()?),
        Command::RenderMarkdown { file } => commands::render_markdown(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "alist-preview",
            "resolve",
            "alist://%2Fa.txt",
            "--server-url",
            "http://nas:5244",
        ])
        .unwrap();
        assert_eq!(cli.server_url.as_deref(), Some("http://nas:5244"));
        assert!(matches!(cli.command, Command::Resolve { ref href } if href == "alist://%2Fa.txt"));
    }

    #[test]
    fn preview_options() {
        let cli = Cli::try_parse_from([
            "alist-preview",
            "preview",
            "alist://%2Fa.md",
            "--out",
            "a.html",
        ])
        .unwrap();
        match cli.command {
            Command::Preview { out, title, .. } => {
                assert_eq!(out, Some(PathBuf::from("a.html")));
                assert!(title.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn command_line_values_override_the_file() {
        let dir = std::env::temp_dir().join(format!("alist-cli-{}", std::process::id()));
        let path = dir.join("settings.json");
        alist_sdk::Settings {
            server_url: "http://from-file:5244".into(),
            username: "file-user".into(),
            password: "file-pw".into(),
        }
        .save(&path)
        .unwrap();

        let provider = CliCredentials {
            settings: SettingsStore::new(&path).without_env_overrides(),
            server_url: None,
            username: Some("cli-user".into()),
            password: Some(String::new()),
        };
        let creds = provider.credentials().unwrap();
        assert_eq!(creds.server_url, "http://from-file:5244");
        assert_eq!(creds.username, "cli-user");
        // Empty values do not override.
        assert_eq!(creds.password, "file-pw");

        std::fs::remove_dir_all(dir).unwrap();
    }
}
