//! Classroom session driver
//!
//! Runs one simulated lesson: the coordinator opens, the turn dispatcher picks
//! each next speaker, and an OpenAI-compatible endpoint writes their lines.
//! Prints the session report when the lesson ends.

mod client;
mod config;
mod session;

use std::fs;

use classroom_scheduler::TurnDispatcher;
use eyre::{Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::OpenaiClient;
use crate::config::SessionConfig;
use crate::session::{ClassroomSession, TranscriptRecord};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SessionConfig::load().wrap_err("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = config.registry()?;
    let dispatcher = TurnDispatcher::new(registry, config.scheduler.clone())?;
    let client = OpenaiClient::new(&config.provider);

    let mut rng = match config.seed {
        Some(seed) => {
            info!(seed, "Using seeded routing");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let session = ClassroomSession::new(&dispatcher, &client, &config.participants, config.max_rounds);
    let outcome = session
        .run(config.coordinator_id()?, &config.opening_message, &mut rng)
        .await?;

    let report = outcome.report(&dispatcher);
    println!("{}", report);

    if let Some(path) = &config.transcript_path {
        let record = TranscriptRecord::new(&outcome, &report);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write transcript to {}", path.display()))?;
        info!(path = %path.display(), "Transcript written");
    }

    Ok(())
}
