//! Open-discussion sub-mode

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiscussionPhase {
    #[default]
    Normal,
    /// Peer discussion; `round` counts dispatch calls since the trigger
    Discussion { round: u32 },
}

/// Outcome of advancing the discussion by one dispatch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscussionStep {
    /// Still discussing, now in this round
    Round(u32),
    /// Round bound exceeded; back to Normal, the Teacher summarises
    Concluded,
}

/// Two-state machine `Normal` / `Discussion(round)` with a round bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscussionMode {
    phase: DiscussionPhase,
    limit: u32,
}

impl DiscussionMode {
    pub fn new(limit: u32) -> Self {
        Self {
            phase: DiscussionPhase::Normal,
            limit,
        }
    }

    pub fn phase(&self) -> DiscussionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, DiscussionPhase::Discussion { .. })
    }

    /// Current round; 0 whenever not discussing
    pub fn round(&self) -> u32 {
        match self.phase {
            DiscussionPhase::Normal => 0,
            DiscussionPhase::Discussion { round } => round,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Enter discussion at round 0; re-entering while active restarts the count
    pub fn enter(&mut self) {
        self.phase = DiscussionPhase::Discussion { round: 0 };
    }

    /// Count one dispatch call. No-op outside discussion.
    pub fn advance(&mut self) -> Option<DiscussionStep> {
        let DiscussionPhase::Discussion { round } = self.phase else {
            return None;
        };
        let round = round + 1;
        if round > self.limit {
            self.phase = DiscussionPhase::Normal;
            Some(DiscussionStep::Concluded)
        } else {
            self.phase = DiscussionPhase::Discussion { round };
            Some(DiscussionStep::Round(round))
        }
    }
}

impl Default for DiscussionMode {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut mode = DiscussionMode::new(4);
        assert!(!mode.is_active());
        assert_eq!(mode.advance(), None);

        mode.enter();
        assert_eq!(mode.round(), 0);
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(1)));
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(2)));
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(3)));
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(4)));
        assert_eq!(mode.advance(), Some(DiscussionStep::Concluded));
        assert_eq!(mode.phase(), DiscussionPhase::Normal);
        assert_eq!(mode.round(), 0);
    }

    #[test]
    fn test_reenter_restarts_rounds() {
        let mut mode = DiscussionMode::new(4);
        mode.enter();
        mode.advance();
        mode.advance();
        mode.enter();
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(1)));
    }

    #[test]
    fn test_reenterable_after_conclusion() {
        let mut mode = DiscussionMode::new(1);
        mode.enter();
        assert_eq!(mode.advance(), Some(DiscussionStep::Round(1)));
        assert_eq!(mode.advance(), Some(DiscussionStep::Concluded));
        mode.enter();
        assert!(mode.is_active());
    }
}
