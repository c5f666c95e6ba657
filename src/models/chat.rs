use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// What produced a message. Only bot messages carry a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "category")]
pub enum MessageKind {
    Welcome,
    Question,
    Reply(Category),
    Nudge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_nudge(&self) -> bool {
        self.kind == MessageKind::Nudge
    }
}

/// Snapshot of a session as the widget renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub is_open: bool,
    pub bot_typing: bool,
    pub messages: Vec<ChatMessage>,
}

/// A message appended to a live session, fanned out to SSE subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEvent {
    pub session_id: String,
    pub message: ChatMessage,
}
