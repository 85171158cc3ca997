//! # Classroom Scheduler
//!
//! Turn scheduler for a simulated classroom discussion. After every utterance
//! the scheduler decides which participant speaks next, or that the
//! conversation is over. It never produces conversational content itself.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      Session driver (external)                       │
//! │   append message ──► select_next() ──► ask chosen participant ──┐    │
//! └──────────────────────────────┬──────────────────────────────────┼────┘
//!                                │                                  │
//!                                ▼                                  │
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                    TurnDispatcher (policies)                         │
//! │                                                                      │
//! │  SignalDetectors ──► rule-priority tree ──► DispatchDecision         │
//! │        │                    │                                        │
//! │        ▼                    ▼                                        │
//! │  ParticipantRegistry   ConversationState                             │
//! │                        ├─ EngagementTracker (silence, interactions)  │
//! │                        └─ DiscussionMode (Normal / Discussion(n))    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`ParticipantRegistry`] - participant id to [`Role`] mapping, registration order preserved
//! - [`EngagementTracker`] - per-student silence counts and directed interaction counts
//! - [`DiscussionMode`] - bounded open-discussion sub-mode
//! - [`SignalDetectors`] - shallow lexical classifiers over utterance text
//! - [`TurnDispatcher`] - the decision procedure, behind the [`SpeakerPolicy`] trait
//! - [`SessionReport`] - read-only end-of-session statistics
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use classroom_scheduler::{
//!     ConversationState, DispatchDecision, ParticipantRegistry, Role, SchedulerConfig,
//!     SpeakerPolicy, Transcript, TurnDispatcher,
//! };
//! use rand::SeedableRng;
//!
//! let registry = ParticipantRegistry::from_roster([
//!     ("Teacher", Role::Teacher),
//!     ("StudentA", Role::Student),
//!     ("StudentB", Role::Student),
//!     ("Coordinator", Role::Coordinator),
//! ])?;
//! let dispatcher = TurnDispatcher::new(registry, SchedulerConfig::default())?;
//! let mut state = dispatcher.new_state();
//! let mut transcript = Transcript::new();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! transcript.push("Coordinator", "Let's begin.");
//! match dispatcher.select_next(transcript.messages(), &mut state, &mut rng)? {
//!     DispatchDecision::Next(id) => println!("{id} speaks next"),
//!     DispatchDecision::Terminate => println!("class dismissed"),
//! }
//! ```

pub mod config;
pub mod discussion;
pub mod engagement;
pub mod error;
pub mod message;
pub mod participant;
pub mod policies;
pub mod random;
pub mod report;
pub mod shared;
pub mod signals;
pub mod state;

// Re-exports
pub use config::{AddressingConfig, RoutingProbabilities, SchedulerConfig};
pub use discussion::{DiscussionMode, DiscussionPhase, DiscussionStep};
pub use engagement::{EngagementTracker, InteractionKey};
pub use error::{SchedulerError, SchedulerResult};
pub use message::{Message, Transcript};
pub use participant::{Participant, ParticipantRegistry, Role};
pub use policies::{DispatchDecision, SpeakerPolicy, TurnDispatcher};
pub use random::RandomSource;
pub use report::{InteractionQuality, SessionReport, SpeakerShare, StudentInteraction};
pub use shared::SharedConversation;
pub use signals::{AddressMatcher, SignalDetectors};
pub use state::ConversationState;
