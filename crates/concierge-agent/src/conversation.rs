//! In-memory chat transcript bounded by user turns.

use uuid::Uuid;

use crate::llm::Message;

/// Transcript of one chat session.
///
/// Only the last `max_turns` user turns are kept. A turn starts at a user
/// message and owns everything up to the next one, so tool calls and their
/// results are never split.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    max_turns: usize,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(max_turns: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            max_turns: max_turns.max(1),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Append a completed turn. Returns true when older turns were dropped.
    pub fn append(&mut self, items: impl IntoIterator<Item = Message>) -> bool {
        self.messages.extend(items);
        self.trim()
    }

    fn trim(&mut self) -> bool {
        let mut seen = 0;
        let start = self
            .messages
            .iter()
            .rposition(|m| {
                if m.is_user() {
                    seen += 1;
                }
                seen == self.max_turns
            })
            .unwrap_or(0);

        if start > 0 {
            self.messages.drain(..start);
            true
        } else {
            false
        }
    }

    /// Start over with a fresh id. Memory notes are not affected.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.id = Uuid::new_v4();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(20)
    }
}
