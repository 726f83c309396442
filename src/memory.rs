use crate::message::Message;

/// In-memory transcript for a single turn.
#[derive(Default, Clone, Debug)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + '_ {
        self.messages.iter()
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_messages_in_order() {
        let mut transcript = Transcript::default();
        transcript.push(Message::user("hi"));
        transcript.push(Message::assistant("hello"));

        assert_eq!(transcript.len(), 2);
        let roles: Vec<_> = transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![crate::message::Role::User, crate::message::Role::Assistant]);
    }
}
