use chrono::{DateTime, Utc};
use classroom_scheduler::{
    ConversationState, DispatchDecision, RandomSource, SessionReport, SpeakerPolicy, Transcript,
};
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::ContentGenerator;
use crate::config::ParticipantConfig;

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The scheduler saw a termination keyword or had nobody left to route to
    Terminated,
    /// The transcript reached `max_rounds` messages
    RoundLimit,
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub end: SessionEnd,
    pub transcript: Transcript,
    pub state: ConversationState,
}

impl SessionOutcome {
    pub fn report(&self, policy: &dyn SpeakerPolicy) -> SessionReport {
        SessionReport::build(self.transcript.messages(), policy.registry(), &self.state)
    }
}

/// Transcript file layout
#[derive(Debug, Serialize)]
pub struct TranscriptRecord<'a> {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub end: SessionEnd,
    pub transcript: &'a Transcript,
    pub report: &'a SessionReport,
}

impl<'a> TranscriptRecord<'a> {
    pub fn new(outcome: &'a SessionOutcome, report: &'a SessionReport) -> Self {
        Self {
            session_id: outcome.session_id.to_string(),
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            end: outcome.end,
            transcript: &outcome.transcript,
            report,
        }
    }
}

/// Alternates between asking the policy who speaks and asking the generator
/// what they say, until the policy terminates or the round limit is hit.
pub struct ClassroomSession<'a> {
    policy: &'a dyn SpeakerPolicy,
    generator: &'a dyn ContentGenerator,
    participants: &'a [ParticipantConfig],
    max_rounds: usize,
}

impl<'a> ClassroomSession<'a> {
    pub fn new(
        policy: &'a dyn SpeakerPolicy,
        generator: &'a dyn ContentGenerator,
        participants: &'a [ParticipantConfig],
        max_rounds: usize,
    ) -> Self {
        Self {
            policy,
            generator,
            participants,
            max_rounds,
        }
    }

    fn profile(&self, id: &str) -> Result<&'a ParticipantConfig> {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| eyre!("no participant profile configured for '{}'", id))
    }

    pub async fn run<R: RandomSource>(
        &self,
        opening_speaker: &str,
        opening_message: &str,
        rng: &mut R,
    ) -> Result<SessionOutcome> {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut transcript = Transcript::new();
        let mut state = self.policy.new_state();

        info!(%session_id, "Session started");
        transcript.push(opening_speaker, opening_message);
        info!(speaker = %opening_speaker, "{}", opening_message);

        let end = loop {
            if transcript.len() >= self.max_rounds {
                warn!(rounds = transcript.len(), "Round limit reached");
                break SessionEnd::RoundLimit;
            }

            let decision = self
                .policy
                .select_next(transcript.messages(), &mut state, &mut *rng)?;
            let speaker = match decision {
                DispatchDecision::Terminate => break SessionEnd::Terminated,
                DispatchDecision::Next(speaker) => speaker,
            };

            let profile = self.profile(&speaker)?;
            let content = self
                .generator
                .generate(profile, transcript.messages())
                .await
                .wrap_err_with(|| format!("failed to generate a turn for {}", speaker))?;
            info!(speaker = %speaker, "{}", content);
            transcript.push(speaker, content);
        };

        info!(%session_id, ?end, turns = transcript.len(), "Session finished");
        Ok(SessionOutcome {
            session_id,
            started_at,
            finished_at: Utc::now(),
            end,
            transcript,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ContentGenerator;
    use classroom_scheduler::{Message, ParticipantRegistry, Role, SchedulerConfig, TurnDispatcher};
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Mutex;

    /// Every chance succeeds and every pick takes the first candidate
    struct AlwaysFirst;

    impl RandomSource for AlwaysFirst {
        fn next_unit(&mut self) -> f64 {
            0.0
        }

        fn pick_index(&mut self, _len: usize) -> usize {
            0
        }
    }

    /// Replays queued lines per speaker; the last line repeats
    struct ScriptedGenerator {
        lines: Mutex<HashMap<String, VecDeque<String>>>,
    }

    impl ScriptedGenerator {
        fn new(script: &[(&str, &[&str])]) -> Self {
            let lines = script
                .iter()
                .map(|(id, lines)| (id.to_string(), lines.iter().map(|l| l.to_string()).collect()))
                .collect();
            Self {
                lines: Mutex::new(lines),
            }
        }
    }

    #[async_trait::async_trait]
    impl ContentGenerator for ScriptedGenerator {
        async fn generate(&self, speaker: &ParticipantConfig, _history: &[Message]) -> Result<String> {
            let mut lines = self.lines.lock().await;
            let queue = lines
                .get_mut(&speaker.id)
                .ok_or_else(|| eyre!("{} has nothing to say", speaker.id))?;
            match queue.len() {
                0 => Err(eyre!("{} has nothing to say", speaker.id)),
                1 => Ok(queue[0].clone()),
                _ => Ok(queue.pop_front().unwrap_or_default()),
            }
        }
    }

    fn profiles() -> Vec<ParticipantConfig> {
        [
            ("Teacher", Role::Teacher),
            ("StudentA", Role::Student),
            ("StudentB", Role::Student),
            ("Coordinator", Role::Coordinator),
        ]
        .into_iter()
        .map(|(id, role)| ParticipantConfig {
            id: id.to_string(),
            role,
            system_prompt: String::new(),
            temperature: None,
            model: None,
        })
        .collect()
    }

    fn dispatcher(profiles: &[ParticipantConfig]) -> TurnDispatcher {
        let registry = ParticipantRegistry::from_roster(profiles.iter().map(|p| (p.id.as_str(), p.role)))
            .unwrap();
        TurnDispatcher::new(registry, SchedulerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_session_runs_until_dismissed() {
        let profiles = profiles();
        let dispatcher = dispatcher(&profiles);
        let generator = ScriptedGenerator::new(&[
            ("Teacher", &["StudentA，你来说说什么是惯性？", "今天就到这里，下课！"]),
            ("StudentA", &["惯性就是保持原来的状态。"]),
        ]);
        let session = ClassroomSession::new(&dispatcher, &generator, &profiles, 25);

        let outcome = session
            .run("Coordinator", "老师，今天讨论牛顿第一定律。", &mut AlwaysFirst)
            .await
            .unwrap();

        assert_eq!(outcome.end, SessionEnd::Terminated);
        let speakers: Vec<_> = outcome
            .transcript
            .messages()
            .iter()
            .map(|m| m.speaker.as_str())
            .collect();
        assert_eq!(speakers, ["Coordinator", "Teacher", "StudentA", "Teacher"]);

        let report = outcome.report(&dispatcher);
        assert_eq!(report.total_turns, 4);
        assert_eq!(report.distinct_student_pairs, 0);
    }

    #[tokio::test]
    async fn test_session_stops_at_round_limit() {
        let profiles = profiles();
        let dispatcher = dispatcher(&profiles);
        let generator = ScriptedGenerator::new(&[
            ("Teacher", &["我们先看一个小实验。"]),
            ("StudentA", &["我觉得小车会一直滑下去"]),
        ]);
        let session = ClassroomSession::new(&dispatcher, &generator, &profiles, 3);

        let outcome = session
            .run("Coordinator", "老师，今天讨论牛顿第一定律。", &mut AlwaysFirst)
            .await
            .unwrap();

        assert_eq!(outcome.end, SessionEnd::RoundLimit);
        assert_eq!(outcome.transcript.len(), 3);
        assert_eq!(outcome.transcript.messages()[2].speaker, "StudentA");
    }

    #[tokio::test]
    async fn test_generator_failure_aborts_session() {
        let profiles = profiles();
        let dispatcher = dispatcher(&profiles);
        let generator = ScriptedGenerator::new(&[]);
        let session = ClassroomSession::new(&dispatcher, &generator, &profiles, 25);

        let err = session
            .run("Coordinator", "老师，今天讨论牛顿第一定律。", &mut AlwaysFirst)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Teacher"));
    }

    #[tokio::test]
    async fn test_unknown_opening_speaker_rejected() {
        let profiles = profiles();
        let dispatcher = dispatcher(&profiles);
        let generator = ScriptedGenerator::new(&[]);
        let session = ClassroomSession::new(&dispatcher, &generator, &profiles, 25);

        let result = session.run("Principal", "大家好，我来听课。", &mut AlwaysFirst).await;
        assert!(result.is_err());
    }
}
