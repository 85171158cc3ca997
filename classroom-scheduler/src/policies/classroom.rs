use tracing::{debug, info, warn};

use super::{DispatchDecision, SpeakerPolicy};
use crate::config::{RoutingProbabilities, SchedulerConfig};
use crate::discussion::DiscussionStep;
use crate::error::{SchedulerError, SchedulerResult};
use crate::message::Message;
use crate::participant::{Participant, ParticipantRegistry, Role};
use crate::random::{self, RandomSource};
use crate::signals::{AddressMatcher, SignalDetectors};
use crate::state::ConversationState;

/// Which branch of the rule tree produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Bootstrap,
    AnomalyRecovery,
    Termination,
    DiscussionRelay,
    DiscussionOpening,
    DiscussionSummary,
    DirectAddress,
    TeacherQuestion,
    PeerResponse,
    TeacherReview,
    PeerSupplement,
    TeacherGuidance,
    CoordinatorHandoff,
    DefaultTeacher,
    RandomFallback,
}

fn route(rule: Rule, id: &str) -> DispatchDecision {
    debug!(rule = ?rule, next = %id, "routing turn");
    DispatchDecision::Next(id.to_string())
}

fn terminate(rule: Rule) -> DispatchDecision {
    info!(rule = ?rule, "conversation ends");
    DispatchDecision::Terminate
}

/// First 50 characters, for log lines
fn preview(content: &str) -> String {
    content.chars().take(50).collect()
}

fn ids<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Vec<&'a str> {
    participants.into_iter().map(|p| p.id.as_str()).collect()
}

/// Rule-priority dispatcher for a Teacher-led classroom
///
/// Rules, first match wins:
/// 1. first message of the session → Teacher
/// 2. anomalous utterance → random participant other than the speaker
/// 3. end-of-session keyword → terminate
/// 4. (bookkeeping) silence counts, discussion trigger
/// 5. discussion mode → student relay / Teacher summary
/// 6. a student called on by name → that student
/// 7. Teacher question → most silent (or random) student
/// 8. student opinion, question or answer → peer or Teacher
/// 9. Coordinator → Teacher
/// 10. fallback → Teacher or random participant
pub struct TurnDispatcher {
    registry: ParticipantRegistry,
    detectors: SignalDetectors,
    /// One matcher per Student, in registration order
    student_matchers: Vec<AddressMatcher>,
}

impl TurnDispatcher {
    pub fn new(registry: ParticipantRegistry, config: SchedulerConfig) -> SchedulerResult<Self> {
        let detectors = SignalDetectors::new(config)?;
        let student_matchers = registry
            .students()
            .map(|p| detectors.address_matcher(&p.id))
            .collect::<SchedulerResult<Vec<_>>>()?;

        if registry.students().count() < 2 {
            warn!("fewer than two students registered; peer interaction rules will not fire");
        }

        Ok(Self {
            registry,
            detectors,
            student_matchers,
        })
    }

    pub fn detectors(&self) -> &SignalDetectors {
        &self.detectors
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.detectors.config()
    }

    fn probabilities(&self) -> RoutingProbabilities {
        self.detectors.config().probabilities
    }

    /// Discussion-mode routing; `None` falls through to the regular rules
    fn route_discussion(
        &self,
        speaker: &Participant,
        state: &mut ConversationState,
        rng: &mut dyn RandomSource,
    ) -> Option<DispatchDecision> {
        match state.discussion.advance()? {
            DiscussionStep::Concluded => {
                info!("discussion mode finished, handing back to the teacher");
                Some(route(Rule::DiscussionSummary, &self.registry.teacher().id))
            }
            DiscussionStep::Round(round) => match speaker.role {
                Role::Student => {
                    let others = ids(self.registry.other_students(&speaker.id));
                    let selected = state.engagement.most_silent(&others)?;
                    debug!(round, "discussion relay");
                    state.engagement.record_interaction(&speaker.id, selected);
                    Some(route(Rule::DiscussionRelay, selected))
                }
                Role::Teacher => {
                    let students = ids(self.registry.students());
                    debug!(round, "discussion opening");
                    random::choose(rng, &students).map(|id| route(Rule::DiscussionOpening, id))
                }
                Role::Coordinator => None,
            },
        }
    }

    /// A registered student other than the speaker called on by name
    fn route_addressing(
        &self,
        speaker: &Participant,
        content: &str,
        state: &mut ConversationState,
    ) -> Option<DispatchDecision> {
        let matcher = self
            .student_matchers
            .iter()
            .find(|m| m.name() != speaker.id && m.matches(content))?;
        state.engagement.record_interaction(&speaker.id, matcher.name());
        Some(route(Rule::DirectAddress, matcher.name()))
    }

    fn route_teacher(
        &self,
        content: &str,
        state: &ConversationState,
        rng: &mut dyn RandomSource,
    ) -> Option<DispatchDecision> {
        if !self.detectors.is_teacher_question(content) {
            return None;
        }
        let students = ids(self.registry.students());
        if students.is_empty() {
            return None;
        }

        let selected = if rng.chance(self.probabilities().silent_student_on_question) {
            state.engagement.most_silent(&students)
        } else {
            random::choose(rng, &students).copied()
        }?;
        debug!(
            student = %selected,
            silence = state.engagement.silence(selected),
            "teacher question"
        );
        Some(route(Rule::TeacherQuestion, selected))
    }

    fn route_student(
        &self,
        speaker: &Participant,
        content: &str,
        history: &[Message],
        state: &mut ConversationState,
        rng: &mut dyn RandomSource,
    ) -> Option<DispatchDecision> {
        let probabilities = self.probabilities();
        let teacher = &self.registry.teacher().id;
        let others = ids(self.registry.other_students(&speaker.id));

        if self.detectors.is_opinion_or_hedge(content) || self.detectors.is_question(content) {
            if rng.chance(probabilities.peer_response) {
                if let Some(selected) = state.engagement.least_interacted(&speaker.id, &others) {
                    state.engagement.record_interaction(&speaker.id, selected);
                    return Some(route(Rule::PeerResponse, selected));
                }
            }
        }

        if self.detectors.teacher_asked_recently(history, teacher) {
            if rng.chance(probabilities.teacher_review) {
                return Some(route(Rule::TeacherReview, teacher));
            }
            return random::choose(rng, &others).map(|id| route(Rule::PeerSupplement, id));
        }

        if rng.chance(probabilities.teacher_guidance) {
            return Some(route(Rule::TeacherGuidance, teacher));
        }
        None
    }

    fn route_default(&self, speaker: &Participant, rng: &mut dyn RandomSource) -> DispatchDecision {
        if !speaker.is_teacher() && rng.chance(self.probabilities().default_teacher) {
            return route(Rule::DefaultTeacher, &self.registry.teacher().id);
        }
        let eligible = ids(self.registry.routable_except(&speaker.id));
        match random::choose(rng, &eligible) {
            Some(id) => route(Rule::RandomFallback, id),
            None => terminate(Rule::RandomFallback),
        }
    }
}

impl SpeakerPolicy for TurnDispatcher {
    fn select_next(
        &self,
        history: &[Message],
        state: &mut ConversationState,
        rng: &mut dyn RandomSource,
    ) -> SchedulerResult<DispatchDecision> {
        let last = history.last().ok_or(SchedulerError::EmptyHistory)?;
        let speaker = self.registry.require(&last.speaker)?;

        if history.len() == 1 {
            return Ok(route(Rule::Bootstrap, &self.registry.teacher().id));
        }

        let content = last.content.trim();

        if self.detectors.is_anomalous(content, &speaker.id) {
            warn!(speaker = %speaker.id, content = %preview(content), "anomalous utterance");
            let eligible = ids(self.registry.routable_except(&speaker.id));
            return Ok(match random::choose(rng, &eligible) {
                Some(id) => route(Rule::AnomalyRecovery, id),
                None => terminate(Rule::AnomalyRecovery),
            });
        }

        if self.detectors.is_termination(content) {
            return Ok(terminate(Rule::Termination));
        }

        state.engagement.observe_turn(&speaker.id);

        if speaker.is_teacher() && self.detectors.is_discussion_trigger(content) {
            info!("teacher opened the floor, entering discussion mode");
            state.discussion.enter();
        }

        if let Some(decision) = self.route_discussion(speaker, state, rng) {
            return Ok(decision);
        }

        if let Some(decision) = self.route_addressing(speaker, content, state) {
            return Ok(decision);
        }

        let decision = match speaker.role {
            Role::Teacher => self.route_teacher(content, state, rng),
            Role::Student => self.route_student(speaker, content, history, state, rng),
            Role::Coordinator => Some(route(Rule::CoordinatorHandoff, &self.registry.teacher().id)),
        };

        Ok(decision.unwrap_or_else(|| self.route_default(speaker, rng)))
    }

    fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    fn new_state(&self) -> ConversationState {
        ConversationState::new(&self.registry, self.detectors.config().discussion_round_limit)
    }
}
