use serde::{Deserialize, Serialize};

/// Happiness granted for every message the user sends
pub const MESSAGE_HAPPINESS_BONUS: i32 = 5;

/// Reply used when the text generator is unavailable
pub const FALLBACK_REPLY: &str = "I'm feeling a bit quiet right now...";

/// Greeting used when an existing save is loaded without a conversation
pub const WELCOME_BACK: &str = "おかえり！また会えてうれしいな！";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Being,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn being(text: impl Into<String>) -> Self {
        Message {
            sender: Sender::Being,
            text: text.into(),
        }
    }
}

/// Append-only chat log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn opened_with(greeting: impl Into<String>) -> Self {
        Conversation {
            messages: vec![Message::being(greeting)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
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

    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}
