//! Huddle CLI - Talk to the Advisory Team from a Terminal
//!
//! Sends a message to the advisory backend and plays the team's reply back
//! as a live conversation, one agent at a time.
//!
//! # Usage
//!
//! ```bash
//! # One question
//! huddle "Looking for a 3-bedroom near good schools"
//!
//! # Start with the team's greeting, then read questions from stdin
//! huddle --greet
//!
//! # No typing delays, reproducible jitter
//! huddle --instant --seed 7 "What about closing costs?"
//!
//! # Verbose logging
//! RUST_LOG=huddle_core=debug huddle "Hi"
//! ```
//!
//! Ctrl-C during playback abandons the current reply; the timeline is left
//! without a dangling "thinking" indicator.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use huddle_core::config::{default_config_path, load_config_from_path};
use huddle_core::{
    AdvisorBackend, Clock, ConfigOverrides, CycleOutcome, Huddle, HttpAdvisorBackend,
    InstantClock, SubmitError, TokioClock,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use render::{render_update, Output};

/// Huddle - chat with a team of real-estate advisors
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Message to send; reads one message per line from stdin when omitted
    message: Option<String>,

    /// Advisory backend base URL
    #[arg(short = 'u', long, env = "HUDDLE_BACKEND_URL", value_name = "URL")]
    backend_url: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "HUDDLE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Seed for typing-delay jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Reveal messages without typing delays
    #[arg(long)]
    instant: bool,

    /// Play the team's greeting first
    #[arg(short = 'g', long)]
    greet: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new().with_instant(self.instant);
        if let Some(ref url) = self.backend_url {
            overrides = overrides.with_backend_url(url.clone());
        }
        if let Some(ms) = self.timeout_ms {
            overrides = overrides.with_request_timeout_ms(ms);
        }
        if let Some(seed) = self.seed {
            overrides = overrides.with_seed(seed);
        }
        overrides
    }
}

/// Initialize logging on stderr
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("huddle=info,huddle_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Print one cycle's outcome where the renderer doesn't
fn report(outcome: Result<CycleOutcome, SubmitError>) {
    match outcome {
        Ok(CycleOutcome::Played(report)) => {
            info!(
                turns = report.turns,
                messages = report.messages_revealed,
                handoffs = report.handoffs,
                "Reply played"
            );
        }
        Ok(CycleOutcome::Fallback(error)) => {
            warn!(error = %error, "Backend unavailable");
        }
        Err(SubmitError::EmptyMessage) => {}
        Err(e) => eprintln!("huddle: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config_path = args.config.clone().or_else(default_config_path);
    let mut settings =
        load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides().apply(&mut settings);
    settings.validate().context("Invalid configuration")?;

    info!(
        backend = %settings.backend_url,
        source = %settings.source(),
        "Configuration loaded"
    );

    let backend = HttpAdvisorBackend::from_config(&settings.backend_config())
        .context("Failed to create backend client")?;
    if !backend.health_check().await {
        warn!(url = %settings.backend_url, "Backend health check failed; continuing anyway");
    }

    let clock: Arc<dyn Clock> = if args.instant {
        Arc::new(InstantClock::new())
    } else {
        Arc::new(TokioClock)
    };
    let huddle = Huddle::new(backend, clock, settings.huddle_config());

    // Renderer drains updates until the huddle is dropped
    let mut updates = huddle.subscribe_updates();
    let renderer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        loop {
            match updates.recv().await {
                Ok(update) => match render_update(&update) {
                    Some(Output::Stdout(text)) => {
                        let _ = stdout.write_all(text.as_bytes()).await;
                        let _ = stdout.flush().await;
                    }
                    Some(Output::Stderr(text)) => eprintln!("{text}"),
                    None => {}
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Renderer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let session = async {
        if args.greet {
            report(huddle.greet().await);
        }

        match args.message.as_deref() {
            Some(message) => report(huddle.submit(message).await),
            None => {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                    report(huddle.submit(&line).await);
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    };

    let result = tokio::select! {
        result = session => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            info!("Interrupted");
            Ok(())
        }
    };

    drop(huddle);
    let _ = renderer.await;
    result
}
