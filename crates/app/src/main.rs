mod terminal;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use overlay::{driver, Document, Explainer, OverlayConfig, SubmitRejected};
use providers::{EndpointConfig, ExplanationClient};
use shared::settings::Settings;
use shared::store::{EnvFallback, FileStore, SettingsStore};
use shared::FailureKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use terminal::TerminalDocument;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sentient-explain",
    version,
    about = "Explain text in plain language, then ask follow-up questions"
)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Inference endpoint base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Explain TEXT, then read follow-up questions from stdin ("/close" to quit)
    Explain {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Save the API key and preferred language
    Configure {
        #[arg(long)]
        api_key: String,
        #[arg(long, default_value = "")]
        language: String,
        /// Check the key against the endpoint before saving
        #[arg(long)]
        test: bool,
    },
    /// Show the stored settings
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_store = match &cli.settings {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location()?,
    };
    let store: Arc<dyn SettingsStore> = Arc::new(EnvFallback(file_store.clone()));

    let mut endpoint = EndpointConfig::default();
    if let Some(url) = &cli.base_url {
        endpoint = endpoint.with_base_url(url)?;
    }
    let client = Arc::new(ExplanationClient::new(endpoint, store.clone())?);

    match cli.command {
        Command::Explain { text } => run_explain(client, text.join(" ")).await,
        Command::Configure {
            api_key,
            language,
            test,
        } => configure(&file_store, &client, &api_key, &language, test).await,
        Command::Status => status(&file_store, store.as_ref()).await,
    }
}

async fn run_explain(client: Arc<ExplanationClient>, text: String) -> Result<()> {
    let mut explainer = Explainer::new(TerminalDocument::new(text), OverlayConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let Some(request) = explainer.activate(Instant::now()) else {
        bail!("selection is too short to explain");
    };
    driver::spawn_request(client.clone(), request, tx.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        let deadline = explainer.next_deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            Some(completion) = rx.recv() => {
                explainer.complete(completion, Instant::now());
            }
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                explainer.advance(Instant::now());
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    None => stdin_open = false,
                    Some(line) if line.trim() == "/close" => explainer.close(Instant::now()),
                    Some(line) => match explainer.submit_follow_up(&line) {
                        Ok(request) => {
                            driver::spawn_request(client.clone(), request, tx.clone());
                        }
                        Err(SubmitRejected::Empty) => {}
                        Err(e) => eprintln!("{}", e),
                    },
                }
            }
        }

        if !stdin_open {
            close_when_idle(&mut explainer, Instant::now());
        }
        if explainer.popup().current().is_none() {
            break;
        }
    }
    Ok(())
}

/// Without stdin no more questions can come; close once the last answer is shown.
fn close_when_idle<D: Document>(explainer: &mut Explainer<D>, now: Instant) {
    if !explainer.awaiting_response() {
        explainer.close(now);
    }
}

async fn configure(
    store: &FileStore,
    client: &ExplanationClient,
    api_key: &str,
    language: &str,
    test: bool,
) -> Result<()> {
    let settings = Settings::from_input(api_key, language)?;
    if test {
        println!("Testing API key...");
        let key = settings.api_key().context("API key missing")?;
        match client.verify_api_key(key, settings.language()).await {
            Ok(()) => println!("✅ API works! Language: {}", settings.language()),
            Err(FailureKind::ApiError { .. }) => {
                bail!("❌ API key invalid. Please check your key.")
            }
            Err(_) => bail!("❌ Connection failed. Check your internet."),
        }
    }
    store.save(&settings).await.context("Failed to save settings")?;
    println!("✅ Settings saved! Language: {}", settings.language());
    Ok(())
}

async fn status(file: &FileStore, store: &dyn SettingsStore) -> Result<()> {
    let settings = store.load().await?;
    println!("settings file: {}", file.path().display());
    let key_state = if settings.api_key().is_some() {
        "configured"
    } else {
        "missing"
    };
    println!("api key:       {}", key_state);
    println!("language:      {}", settings.language());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay::popup::Phase;
    use overlay::{Completion, RequestKind};
    use std::time::Duration;

    #[test]
    fn test_explain_joins_words() {
        let args = ["sentient-explain", "explain", "Photosynthesis", "converts", "light"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Explain { text } => {
                assert_eq!(text.join(" "), "Photosynthesis converts light")
            }
            _ => panic!("expected explain"),
        }
    }

    #[test]
    fn test_closed_stdin_waits_for_explanation() {
        let mut explainer =
            Explainer::new(TerminalDocument::new("Photosynthesis"), OverlayConfig::default());
        let t0 = Instant::now();
        let session = explainer.activate(t0).unwrap().session();

        close_when_idle(&mut explainer, t0 + Duration::from_millis(100));
        assert_eq!(explainer.popup().current().unwrap().phase(), Phase::Opening);

        explainer.complete(
            Completion {
                session,
                kind: RequestKind::Explain,
                outcome: Ok("Plants eat sunlight to grow!".into()),
            },
            t0 + Duration::from_millis(500),
        );
        close_when_idle(&mut explainer, t0 + Duration::from_millis(500));
        assert!(explainer.popup().current().unwrap().phase() != Phase::Closing);

        explainer.advance(t0 + Duration::from_millis(800));
        assert!(explainer
            .document()
            .last_printed()
            .unwrap()
            .contains("Plants eat sunlight to grow!"));
        close_when_idle(&mut explainer, t0 + Duration::from_millis(800));
        assert_eq!(explainer.popup().current().unwrap().phase(), Phase::Closing);

        explainer.advance(t0 + Duration::from_millis(1200));
        assert!(explainer.popup().current().is_none());
    }

    #[test]
    fn test_explain_requires_text() {
        assert!(Cli::try_parse_from(["sentient-explain", "explain"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sentient-explain",
            "configure",
            "--api-key",
            "fw-123",
            "--test",
            "--base-url",
            "http://127.0.0.1:9000",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        match cli.command {
            Command::Configure {
                api_key,
                language,
                test,
            } => {
                assert_eq!(api_key, "fw-123");
                assert_eq!(language, "");
                assert!(test);
            }
            _ => panic!("expected configure"),
        }
    }
}
