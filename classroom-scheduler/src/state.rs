//! Per-session mutable scheduling state

use std::collections::{BTreeMap, HashMap};

use crate::discussion::{DiscussionMode, DiscussionPhase};
use crate::engagement::{EngagementTracker, InteractionKey};
use crate::participant::ParticipantRegistry;

/// Everything the dispatcher mutates between turns
///
/// Owned by exactly one session; the dispatcher is its only writer.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub(crate) engagement: EngagementTracker,
    pub(crate) discussion: DiscussionMode,
}

impl ConversationState {
    /// Fresh state tracking every Student of the roster
    pub fn new(registry: &ParticipantRegistry, discussion_round_limit: u32) -> Self {
        Self {
            engagement: EngagementTracker::new(registry.students().map(|p| p.id.clone())),
            discussion: DiscussionMode::new(discussion_round_limit),
        }
    }

    pub fn engagement(&self) -> &EngagementTracker {
        &self.engagement
    }

    pub fn silence_counts(&self) -> &HashMap<String, u32> {
        self.engagement.silence_counts()
    }

    pub fn interaction_matrix(&self) -> &BTreeMap<InteractionKey, u32> {
        self.engagement.interactions()
    }

    pub fn discussion_mode(&self) -> bool {
        self.discussion.is_active()
    }

    pub fn discussion_round(&self) -> u32 {
        self.discussion.round()
    }

    pub fn discussion_phase(&self) -> DiscussionPhase {
        self.discussion.phase()
    }
}
