//! Lock-guarded conversation for deployments with concurrent readers
//!
//! The whole append-and-dispatch step runs under one lock, so readers never
//! observe a transcript and a state from different turns.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engagement::InteractionKey;
use crate::error::SchedulerResult;
use crate::message::{Message, Transcript};
use crate::policies::{DispatchDecision, SpeakerPolicy};
use crate::random::RandomSource;
use crate::report::SessionReport;
use crate::state::ConversationState;

#[derive(Debug)]
struct Inner {
    transcript: Transcript,
    state: ConversationState,
}

/// Cloneable handle to one session's transcript and scheduling state
#[derive(Debug, Clone)]
pub struct SharedConversation {
    inner: Arc<Mutex<Inner>>,
}

impl SharedConversation {
    pub fn new(state: ConversationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                transcript: Transcript::new(),
                state,
            })),
        }
    }

    /// Append an utterance and decide the next speaker in one critical section
    pub fn submit(
        &self,
        speaker: &str,
        content: &str,
        policy: &dyn SpeakerPolicy,
        rng: &mut dyn RandomSource,
    ) -> SchedulerResult<DispatchDecision> {
        let mut guard = self.inner.lock();
        let Inner { transcript, state } = &mut *guard;
        // Validate before appending so a bad id never enters the transcript
        policy.registry().require(speaker)?;
        transcript.push(speaker, content);
        policy.select_next(transcript.messages(), state, rng)
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.inner.lock().transcript.messages().to_vec()
    }

    pub fn silence_counts(&self) -> HashMap<String, u32> {
        self.inner.lock().state.silence_counts().clone()
    }

    pub fn interaction_matrix(&self) -> BTreeMap<InteractionKey, u32> {
        self.inner.lock().state.interaction_matrix().clone()
    }

    pub fn discussion_round(&self) -> u32 {
        self.inner.lock().state.discussion_round()
    }

    pub fn report(&self, policy: &dyn SpeakerPolicy) -> SessionReport {
        let guard = self.inner.lock();
        SessionReport::build(guard.transcript.messages(), policy.registry(), &guard.state)
    }
}
