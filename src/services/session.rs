//! Per-visitor chat controller driven by a virtual clock.
//!
//! Submitting a message never blocks: the bot reply and the optional contact
//! nudge are queued as scheduled tasks and only appended once the clock is
//! advanced past their due time. Callers decide what the clock means (the
//! session store maps it to wall-clock time, tests step it by hand).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{ChatMessage, MessageKind, Sender, SessionView};
use crate::services::responder::{should_nudge, Randomness, ResponseSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTiming {
    pub typing_min: Duration,
    pub typing_max: Duration,
    pub nudge_delay: Duration,
}

impl Default for ChatTiming {
    fn default() -> Self {
        Self {
            typing_min: Duration::from_millis(1000),
            typing_max: Duration::from_millis(2000),
            nudge_delay: Duration::from_millis(3000),
        }
    }
}

impl ChatTiming {
    fn typing_delay(&self, fraction: f64) -> Duration {
        let spread = self.typing_max.saturating_sub(self.typing_min);
        self.typing_min + spread.mul_f64(fraction.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone)]
enum Task {
    BotReply { input: String, nudge: bool },
    Nudge,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    due: Duration,
    seq: u64,
    task: Task,
}

pub struct ChatSession {
    id: String,
    selector: Arc<ResponseSelector>,
    rng: Box<dyn Randomness>,
    timing: ChatTiming,
    started_at: DateTime<Utc>,
    now: Duration,
    is_open: bool,
    messages: Vec<ChatMessage>,
    pending: Vec<ScheduledTask>,
    next_message_id: u64,
    next_seq: u64,
}

impl ChatSession {
    pub fn new(
        id: impl Into<String>,
        selector: Arc<ResponseSelector>,
        rng: Box<dyn Randomness>,
        timing: ChatTiming,
    ) -> Self {
        Self {
            id: id.into(),
            selector,
            rng,
            timing,
            started_at: Utc::now(),
            now: Duration::ZERO,
            is_open: false,
            messages: Vec::new(),
            pending: Vec::new(),
            next_message_id: 1,
            next_seq: 0,
        }
    }

    /// Seeds the log with an opening bot message.
    pub fn with_welcome(mut self, text: &str) -> Self {
        if !text.trim().is_empty() {
            self.append(text.to_string(), Sender::Bot, MessageKind::Welcome);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Hides the widget. Pending replies still land.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn is_bot_typing(&self) -> bool {
        self.pending
            .iter()
            .any(|t| matches!(t.task, Task::BotReply { .. }))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            is_open: self.is_open,
            bot_typing: self.is_bot_typing(),
            messages: self.messages.clone(),
        }
    }

    /// Appends the visitor's message and schedules the bot reply.
    pub fn submit_user_message(&mut self, text: &str) -> ChatMessage {
        let message = self.append(text.to_string(), Sender::User, MessageKind::Question);

        let delay = self.timing.typing_delay(self.rng.fraction());
        let nudge = should_nudge(text);
        self.schedule(
            delay,
            Task::BotReply {
                input: text.to_string(),
                nudge,
            },
        );

        tracing::debug!(
            session = %self.id,
            delay_ms = delay.as_millis() as u64,
            nudge,
            "scheduled bot reply"
        );

        message
    }

    pub fn advance_by(&mut self, elapsed: Duration) -> Vec<ChatMessage> {
        self.advance_to(self.now + elapsed)
    }

    /// Runs every task due at or before `target`, in due order, and returns
    /// the messages they appended. Moving backwards is a no-op.
    pub fn advance_to(&mut self, target: Duration) -> Vec<ChatMessage> {
        let mut appended = Vec::new();

        while let Some(index) = self.next_due(target) {
            let task = self.pending.remove(index);
            self.now = self.now.max(task.due);

            match task.task {
                Task::BotReply { input, nudge } => {
                    let selection = self.selector.select_response(&input, self.rng.as_mut());
                    appended.push(self.append(
                        selection.text,
                        Sender::Bot,
                        MessageKind::Reply(selection.category),
                    ));
                    if nudge {
                        self.schedule(self.timing.nudge_delay, Task::Nudge);
                    }
                }
                Task::Nudge => {
                    let text = self.selector.nudge().to_string();
                    appended.push(self.append(text, Sender::Bot, MessageKind::Nudge));
                }
            }
        }

        self.now = self.now.max(target);
        appended
    }

    /// Drops every pending reply and nudge. Returns how many were dropped.
    pub fn cancel_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn next_due(&self, target: Duration) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)
    }

    fn schedule(&mut self, delay: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(ScheduledTask {
            due: self.now + delay,
            seq,
            task,
        });
    }

    /// Stamped with the virtual time the message was due, so a late catch-up
    /// keeps the original spacing.
    fn append(&mut self, text: String, sender: Sender, kind: MessageKind) -> ChatMessage {
        let offset = chrono::Duration::from_std(self.now).unwrap_or_else(|_| chrono::Duration::zero());
        let message = ChatMessage {
            id: self.next_message_id,
            text,
            sender,
            kind,
            timestamp: self.started_at + offset,
        };
        self.next_message_id += 1;
        self.messages.push(message.clone());
        message
    }
}
