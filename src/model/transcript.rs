use serde::{Deserialize, Serialize};

use crate::model::message::Message;

/// Ordered, append-only conversation history.
///
/// Entries cannot be removed or edited once pushed. The order of messages
/// is the context the model sees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The committed history followed by `next`, without committing `next`.
    pub fn with_pending(&self, next: &Message) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.extend(self.messages.iter().cloned());
        out.push(next.clone());
        out
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_earlier_entries_untouched() {
        let mut t = Transcript::new();
        t.push(Message::system("rules"));
        t.push(Message::user("start"));
        let before = t.messages().to_vec();

        t.push(Message::assistant("Plot: a moon"));

        assert_eq!(t.len(), 3);
        assert_eq!(&t.messages()[..2], before.as_slice());
        assert_eq!(t.last(), Some(&Message::assistant("Plot: a moon")));
    }

    #[test]
    fn with_pending_does_not_commit() {
        let mut t = Transcript::new();
        t.push(Message::system("rules"));

        let request = t.with_pending(&Message::user("1. Explore"));

        assert_eq!(request.len(), 2);
        assert_eq!(request[1], Message::user("1. Explore"));
        assert_eq!(t.len(), 1);
    }
}
