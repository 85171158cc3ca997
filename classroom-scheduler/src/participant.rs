//! Participant registry

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Role of a participant in the classroom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
    /// Opens the session; never routed to by the scheduler
    Coordinator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
            Role::Coordinator => write!(f, "coordinator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub role: Role,
}

impl Participant {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

/// Immutable roster of a session
///
/// Registration order is preserved and is the deterministic iteration order
/// used for every tie-break and "first match" rule.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    participants: Vec<Participant>,
    index: HashMap<String, usize>,
    teacher: usize,
}

impl ParticipantRegistry {
    /// Build a registry, requiring unique non-empty ids and exactly one Teacher
    pub fn new(participants: Vec<Participant>) -> SchedulerResult<Self> {
        let mut index = HashMap::with_capacity(participants.len());
        let mut teacher: Option<usize> = None;

        for (i, participant) in participants.iter().enumerate() {
            if participant.id.trim().is_empty() {
                return Err(SchedulerError::EmptyParticipantId);
            }
            if index.insert(participant.id.clone(), i).is_some() {
                return Err(SchedulerError::DuplicateParticipant(participant.id.clone()));
            }
            if participant.is_teacher() {
                if let Some(existing) = teacher {
                    return Err(SchedulerError::MultipleTeachers(
                        participants[existing].id.clone(),
                        participant.id.clone(),
                    ));
                }
                teacher = Some(i);
            }
        }

        let teacher = teacher.ok_or(SchedulerError::MissingTeacher)?;
        Ok(Self { participants, index, teacher })
    }

    /// Convenience constructor from `(id, role)` pairs
    pub fn from_roster<I, S>(roster: I) -> SchedulerResult<Self>
    where
        I: IntoIterator<Item = (S, Role)>,
        S: Into<String>,
    {
        Self::new(roster.into_iter().map(|(id, role)| Participant::new(id, role)).collect())
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.index.get(id).map(|&i| &self.participants[i])
    }

    /// Look up a participant, failing on ids the roster does not know
    pub fn require(&self, id: &str) -> SchedulerResult<&Participant> {
        self.get(id)
            .ok_or_else(|| SchedulerError::UnknownParticipant(id.to_string()))
    }

    pub fn teacher(&self) -> &Participant {
        &self.participants[self.teacher]
    }

    /// All participants in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Student-role participants in registration order
    pub fn students(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_student())
    }

    /// Students other than `id`, in registration order
    pub fn other_students(&self, id: &str) -> Vec<&Participant> {
        self.students().filter(|p| p.id != id).collect()
    }

    /// Everyone who may be handed a recovery turn: not `id` and not a Coordinator
    pub fn routable_except(&self, id: &str) -> Vec<&Participant> {
        self.participants
            .iter()
            .filter(|p| p.id != id && !p.is_coordinator())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
