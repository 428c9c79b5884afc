//! UI-agnostic conversation types
//!
//! These are what gets persisted under `chatHistory_<title>` and what the
//! chat screen renders. They don't depend on any terminal code.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Role name used by the completion endpoint.
    pub fn role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "assistant",
        }
    }
}

/// One chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl Message {
    /// Build a message whose id follows `previous` (the last id in the
    /// conversation, if any). Ids are epoch milliseconds, bumped by one
    /// when the clock would not move them forward.
    pub fn new(text: impl Into<String>, sender: Sender, previous: Option<&Message>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let floor = previous
            .and_then(|m| m.id.parse::<u128>().ok())
            .map(|last| last + 1)
            .unwrap_or(0);

        Self {
            id: now.max(floor).to_string(),
            text: text.into(),
            sender,
        }
    }
}

/// Storage key for a persona's conversation.
pub fn history_key(title: &str) -> String {
    format!("chatHistory_{}", title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serializes_lowercase() {
        let msg = Message {
            id: "1".to_string(),
            text: "hi".to_string(),
            sender: Sender::Bot,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"id":"1","text":"hi","sender":"bot"}"#);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let first = Message::new("a", Sender::User, None);
        let second = Message::new("b", Sender::Bot, Some(&first));
        let third = Message::new("c", Sender::User, Some(&second));

        let ids: Vec<u128> = [&first, &second, &third]
            .iter()
            .map(|m| m.id.parse().unwrap())
            .collect();
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }

    #[test]
    fn test_id_follows_previous_from_the_future() {
        let previous = Message {
            id: "99999999999999".to_string(),
            text: "later".to_string(),
            sender: Sender::User,
        };
        let next = Message::new("now", Sender::Bot, Some(&previous));
        assert_eq!(next.id, "100000000000000");
    }

    #[test]
    fn test_history_key() {
        assert_eq!(history_key("AI Grandpa"), "chatHistory_AI Grandpa");
    }
}
