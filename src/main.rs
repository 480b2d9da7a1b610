mod ai;
mod app;
mod command;
mod config;
mod constants;
mod error;
mod mail;
mod session;
mod site;
mod triage;

use anyhow::Result;
use std::env;
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::ChatClient;
use crate::app::TriageApp;
use crate::config::Config;
use crate::constants::{ENV_SENDER_APP_CREDENTIAL, ENV_SENDER_EMAIL};
use crate::error::TriageError;
use crate::mail::{MailTransport, SmtpClient};
use crate::site::{HttpLoader, SiteSession};
use crate::triage::{TriageOrchestrator, load_records, sample_records};

fn setup_logging() {
    use std::fs::{self, OpenOptions};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mailtriage=debug"));

    // Log to a file in the config directory so the console stays clean
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("mailtriage.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"mailtriage - Customer email triage with an AI assistant

Usage: mailtriage [command]

Commands:
    (none)          Triage the built-in sample emails
    <file.json>     Triage a JSON array of {{"id", "content"}} records
    site            Analyze a website and ask follow-up questions
    help            Show this help message

Environment:
    MODEL_API_KEY            Model API key (required)
    MAILTRIAGE_MODEL         Override the triage model
    SENDER_EMAIL             Sender address for replies (optional)
    SENDER_APP_CREDENTIAL    SMTP app password for the sender (optional)

Configuration file: ~/.config/mailtriage/config.toml
"#
    );
}

/// Configuration and startup failures end the process with status 1
fn exit_on_error(e: TriageError) -> ! {
    tracing::error!("{}", e);
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

async fn run_triage(config: Config, input: Option<&Path>) -> Result<()> {
    let records = match input {
        Some(path) => load_records(path)?,
        None => sample_records(),
    };

    let client = ChatClient::new(&config.ai).unwrap_or_else(|e| exit_on_error(e));
    tracing::info!("Triage model: {}", client.model());

    let smtp = match config.smtp.sender_credentials() {
        Some(sender) => match SmtpClient::new(&config.smtp, &sender) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("SMTP disabled: {:#}", e);
                None
            }
        },
        None => {
            tracing::info!(
                "{} / {} not set, replies will not be sent",
                ENV_SENDER_EMAIL,
                ENV_SENDER_APP_CREDENTIAL
            );
            None
        }
    };
    let transport = smtp.as_ref().map(|c| c as &dyn MailTransport);

    println!("Eva is analyzing {} email(s)...", records.len());
    let batch = match TriageOrchestrator::new(&client)
        .strict_priority(config.triage.strict_priority)
        .run(&records)
        .await
    {
        Ok(batch) => batch,
        Err(e) => exit_on_error(e),
    };
    for violation in batch.policy_violations() {
        println!("Warning: {}", violation);
    }
    println!("Analysis complete.\n");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut app = TriageApp::new(&client, &records, batch, stdin.lock(), stdout.lock())
        .with_transport(transport)
        .with_subject_prefix(&config.triage.reply_subject_prefix);
    app.run().await
}

async fn run_site(config: Config) -> Result<()> {
    let client = ChatClient::new(&config.ai)
        .unwrap_or_else(|e| exit_on_error(e))
        .with_model(&config.site.model, config.site.temperature);
    let loader = match HttpLoader::new(config.site.content_limit, config.ai.timeout_secs) {
        Ok(loader) => loader,
        Err(e) => exit_on_error(e),
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    SiteSession::new(&client, &loader, stdin.lock(), stdout.lock())
        .run()
        .await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("site") => {
            setup_logging();
            let config = Config::load()?;
            run_site(config).await
        }
        Some(path) if path.ends_with(".json") => {
            setup_logging();
            let config = Config::load()?;
            run_triage(config, Some(Path::new(path))).await
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
        None => {
            setup_logging();
            let config = Config::load()?;
            run_triage(config, None).await
        }
    }
}
