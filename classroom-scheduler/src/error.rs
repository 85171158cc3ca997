//! Error types for the scheduler

use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler errors
///
/// Recoverable conversational oddities (malformed utterances, empty candidate
/// sets) are absorbed by the rule tree and never show up here. Only registry
/// and configuration consistency violations do.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Conversation history is empty")]
    EmptyHistory,

    #[error("Participant registered twice: {0}")]
    DuplicateParticipant(String),

    #[error("Participant id must not be empty")]
    EmptyParticipantId,

    #[error("Roster has no Teacher-role participant")]
    MissingTeacher,

    #[error("Roster has more than one Teacher-role participant: {0} and {1}")]
    MultipleTeachers(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid addressing pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
