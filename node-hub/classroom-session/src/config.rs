use std::collections::HashSet;
use std::path::PathBuf;

use classroom_scheduler::{Participant, ParticipantRegistry, Role, SchedulerConfig, SchedulerResult};
use eyre::{bail, eyre};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use serde::Deserialize;
use tracing::warn;

/// Session configuration.
///
/// Loaded from a TOML/YAML/JSON file and `CLASSROOM_`-prefixed environment
/// variables. Nested keys use `__` as separator, e.g. `CLASSROOM_PROVIDER__MODEL`.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// First message of the session, spoken by the coordinator
    pub opening_message: String,
    /// Upper bound on transcript length, opening message included
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// Fixes the routing draws for reproducible sessions
    pub seed: Option<u64>,
    /// Where to write the transcript and report as JSON
    pub transcript_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub provider: ProviderConfig,
    pub participants: Vec<ParticipantConfig>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_max_rounds() -> usize {
    25
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OpenAI-compatible chat completion endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    /// Base URL; `/chat/completions` is appended. Accepts `env:VAR`.
    pub api_url: String,
    /// Accepts `env:VAR`
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub proxy: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParticipantConfig {
    pub id: String,
    pub role: Role,
    /// Persona instructions sent as the system message
    #[serde(default)]
    pub system_prompt: String,
    pub temperature: Option<f32>,
    /// Overrides the provider's model for this participant
    pub model: Option<String>,
}

impl SessionConfig {
    /// Load configuration from the file named by `CLASSROOM_CONFIG_PATH`.
    ///
    /// Falls back to `classroom.toml` in the working directory.
    pub fn load() -> eyre::Result<Self> {
        let config_file =
            std::env::var("CLASSROOM_CONFIG_PATH").unwrap_or_else(|_| "classroom.toml".to_string());
        let config_path = PathBuf::from(config_file);

        if !config_path.exists() {
            bail!("Config file not found at: {}", config_path.display());
        }

        let figment = match config_path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Figment::new().merge(Yaml::file(config_path)),
            Some("json") => Figment::new().merge(Json::file(config_path)),
            _ => Figment::new().merge(Toml::file(config_path)),
        };

        Self::from_figment(figment.merge(Env::prefixed("CLASSROOM_").split("__")))
    }

    pub fn from_figment(figment: Figment) -> eyre::Result<Self> {
        let config: SessionConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.max_rounds == 0 {
            bail!("max_rounds must be at least 1");
        }
        if self.opening_message.trim().is_empty() {
            bail!("opening_message must not be empty");
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if !seen.insert(participant.id.as_str()) {
                bail!("participant '{}' is configured twice", participant.id);
            }
            if participant.role != Role::Coordinator && participant.system_prompt.trim().is_empty() {
                warn!("participant '{}' has no system prompt", participant.id);
            }
        }

        self.coordinator_id()?;
        self.scheduler.validate()?;
        self.registry()?;
        Ok(())
    }

    /// Id of the participant who speaks the opening message
    pub fn coordinator_id(&self) -> eyre::Result<&str> {
        self.participants
            .iter()
            .find(|p| p.role == Role::Coordinator)
            .map(|p| p.id.as_str())
            .ok_or_else(|| eyre!("a coordinator participant is required to open the session"))
    }

    pub fn registry(&self) -> SchedulerResult<ParticipantRegistry> {
        ParticipantRegistry::new(
            self.participants
                .iter()
                .map(|p| Participant::new(p.id.clone(), p.role))
                .collect(),
        )
    }
}

/// Resolve `env:VAR` indirection, returning other values unchanged
pub fn get_env_or_value(value: &str) -> String {
    match value.strip_prefix("env:") {
        Some(env_var) => {
            let result = std::env::var(env_var)
                .unwrap_or_else(|_| {
                    warn!("Environment variable {} not found", env_var);
                    String::new()
                })
                .trim()
                .to_string();
            if result.is_empty() {
                warn!("Environment variable {} is empty", env_var);
            }
            result
        }
        None => value.to_string(),
    }
}
