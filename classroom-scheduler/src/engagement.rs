//! Engagement tracking: student silence and directed hand-off counts

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Directed pair key for the interaction matrix
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionKey {
    pub from: String,
    pub to: String,
}

impl InteractionKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Silence counters for the Student roster plus the interaction matrix
#[derive(Debug, Clone, Default)]
pub struct EngagementTracker {
    silence: HashMap<String, u32>,
    interactions: BTreeMap<InteractionKey, u32>,
}

impl EngagementTracker {
    /// Start tracking the given students, all at silence 0
    pub fn new<I, S>(students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            silence: students.into_iter().map(|s| (s.into(), 0)).collect(),
            interactions: BTreeMap::new(),
        }
    }

    /// Reset the speaker's silence and age every other student by one turn
    ///
    /// Non-student speakers age every student.
    pub fn observe_turn(&mut self, speaker: &str) {
        for (student, count) in self.silence.iter_mut() {
            if student == speaker {
                *count = 0;
            } else {
                *count += 1;
            }
        }
    }

    pub fn record_interaction(&mut self, from: &str, to: &str) {
        *self.interactions.entry(InteractionKey::new(from, to)).or_insert(0) += 1;
    }

    /// Turns since `student` last spoke; 0 for untracked ids
    pub fn silence(&self, student: &str) -> u32 {
        self.silence.get(student).copied().unwrap_or(0)
    }

    pub fn interactions_between(&self, from: &str, to: &str) -> u32 {
        self.interactions
            .get(&InteractionKey::new(from, to))
            .copied()
            .unwrap_or(0)
    }

    /// Candidate with the highest silence count; earliest candidate wins ties
    pub fn most_silent<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(&'a str, u32)> = None;
        for &candidate in candidates {
            let silence = self.silence(candidate);
            if best.map_or(true, |(_, top)| silence > top) {
                best = Some((candidate, silence));
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    /// Candidate `from` has handed the fewest turns to; earliest candidate wins ties
    pub fn least_interacted<'a>(&self, from: &str, candidates: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(&'a str, u32)> = None;
        for &candidate in candidates {
            let count = self.interactions_between(from, candidate);
            if best.map_or(true, |(_, low)| count < low) {
                best = Some((candidate, count));
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    pub fn silence_counts(&self) -> &HashMap<String, u32> {
        &self.silence
    }

    /// Interaction matrix, ordered by `(from, to)`
    pub fn interactions(&self) -> &BTreeMap<InteractionKey, u32> {
        &self.interactions
    }
}
