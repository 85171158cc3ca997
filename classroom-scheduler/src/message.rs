//! Conversation messages

use serde::{Deserialize, Serialize};

/// One produced utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Position in the conversation, starting at 0
    pub index: usize,
    /// Id of the registered participant who said it
    pub speaker: String,
    pub content: String,
}

impl Message {
    pub fn new(index: usize, speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            index,
            speaker: speaker.into(),
            content: content.into(),
        }
    }
}

/// Append-only message history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning the next sequence index
    pub fn push(&mut self, speaker: impl Into<String>, content: impl Into<String>) -> &Message {
        let index = self.messages.len();
        self.messages.push(Message::new(index, speaker, content));
        &self.messages[index]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_sequential_indices() {
        let mut transcript = Transcript::new();
        transcript.push("Coordinator", "Let's begin.");
        transcript.push("Teacher", "今天我们讨论牛顿第一定律。");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].index, 0);
        assert_eq!(transcript.last().unwrap().index, 1);
        assert_eq!(transcript.last().unwrap().speaker, "Teacher");
    }
}
