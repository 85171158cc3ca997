//! End-of-session statistics
//!
//! A pure consumer of the transcript and the scheduler state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::participant::{ParticipantRegistry, Role};
use crate::state::ConversationState;

/// How lively the peer interaction was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionQuality {
    Excellent,
    Good,
    NeedsImprovement,
}

impl InteractionQuality {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 30.0 {
            InteractionQuality::Excellent
        } else if ratio > 20.0 {
            InteractionQuality::Good
        } else {
            InteractionQuality::NeedsImprovement
        }
    }
}

impl fmt::Display for InteractionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionQuality::Excellent => write!(f, "excellent"),
            InteractionQuality::Good => write!(f, "good"),
            InteractionQuality::NeedsImprovement => write!(f, "needs improvement"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerShare {
    pub participant: String,
    pub role: Role,
    pub turns: usize,
    /// Share of all messages, in percent
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentInteraction {
    pub from: String,
    pub to: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub total_turns: usize,
    /// Teacher and Students, in registration order
    pub speakers: Vec<SpeakerShare>,
    /// Student-to-student hand-offs, ordered by pair
    pub student_interactions: Vec<StudentInteraction>,
    /// Number of distinct student pairs with at least one hand-off
    pub distinct_student_pairs: usize,
    pub total_student_handoffs: u32,
    /// Distinct student pairs per hundred turns
    pub interaction_ratio: f64,
    pub quality: InteractionQuality,
}

impl SessionReport {
    pub fn build(history: &[Message], registry: &ParticipantRegistry, state: &ConversationState) -> Self {
        let total_turns = history.len();
        let percent = |n: usize| {
            if total_turns == 0 {
                0.0
            } else {
                n as f64 * 100.0 / total_turns as f64
            }
        };

        let speakers = registry
            .iter()
            .filter(|p| !p.is_coordinator())
            .map(|p| {
                let turns = history.iter().filter(|m| m.speaker == p.id).count();
                SpeakerShare {
                    participant: p.id.clone(),
                    role: p.role,
                    turns,
                    percentage: percent(turns),
                }
            })
            .collect();

        let is_student = |id: &str| registry.get(id).map_or(false, |p| p.is_student());
        let student_interactions: Vec<StudentInteraction> = state
            .interaction_matrix()
            .iter()
            .filter(|(key, _)| is_student(key.from.as_str()) && is_student(key.to.as_str()))
            .map(|(key, &count)| StudentInteraction {
                from: key.from.clone(),
                to: key.to.clone(),
                count,
            })
            .collect();

        let distinct_student_pairs = student_interactions.len();
        let total_student_handoffs = student_interactions.iter().map(|i| i.count).sum();
        let interaction_ratio = percent(distinct_student_pairs);

        Self {
            total_turns,
            speakers,
            student_interactions,
            distinct_student_pairs,
            total_student_handoffs,
            interaction_ratio,
            quality: InteractionQuality::from_ratio(interaction_ratio),
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total turns: {}", self.total_turns)?;
        writeln!(f)?;
        writeln!(f, "Speaking turns:")?;
        for share in &self.speakers {
            writeln!(f, "  {:12} {:2} ({:5.1}%)", share.participant, share.turns, share.percentage)?;
        }
        writeln!(f)?;
        writeln!(f, "Student interactions:")?;
        for interaction in &self.student_interactions {
            writeln!(f, "  {} → {}: {}", interaction.from, interaction.to, interaction.count)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Student pairs: {} ({} hand-offs)",
            self.distinct_student_pairs, self.total_student_handoffs
        )?;
        write!(
            f,
            "Interaction ratio: {:.1}% ({})",
            self.interaction_ratio, self.quality
        )
    }
}
