// Policy module for the classroom scheduler
// Defines the speaker-selection seam and the rule-driven classroom dispatcher

pub mod classroom;

pub use classroom::TurnDispatcher;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerResult;
use crate::message::Message;
use crate::participant::ParticipantRegistry;
use crate::random::RandomSource;
use crate::state::ConversationState;

/// What the driver should do after a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "participant", rename_all = "snake_case")]
pub enum DispatchDecision {
    /// Ask this participant for the next utterance
    Next(String),
    /// The conversation is over
    Terminate,
}

impl DispatchDecision {
    pub fn participant(&self) -> Option<&str> {
        match self {
            DispatchDecision::Next(id) => Some(id),
            DispatchDecision::Terminate => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchDecision::Terminate)
    }
}

/// Core trait for speaker-selection policies
///
/// A policy is immutable configuration; all per-session bookkeeping lives in
/// the [`ConversationState`] it is handed on every call.
pub trait SpeakerPolicy: Send + Sync {
    /// Decide who speaks after the last message of `history`
    ///
    /// Called exactly once per completed turn. `history` holds at least the
    /// message just produced.
    fn select_next(
        &self,
        history: &[Message],
        state: &mut ConversationState,
        rng: &mut dyn RandomSource,
    ) -> SchedulerResult<DispatchDecision>;

    /// Roster the policy routes over
    fn registry(&self) -> &ParticipantRegistry;

    /// Empty state for a new session
    fn new_state(&self) -> ConversationState;
}

#[cfg(test)]
mod tests {
    mod classroom_test;
}
