use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::errors::AppError;
use crate::models::{ChatEvent, ChatMessage, SessionView};
use crate::services::responder::{Randomness, ResponseSelector, SeededRandomness};
use crate::services::session::{ChatSession, ChatTiming};

struct SessionEntry {
    session: ChatSession,
    started_at: Instant,
    last_activity: Instant,
}

impl SessionEntry {
    fn catch_up(&mut self, now: Instant) -> Vec<ChatMessage> {
        self.session
            .advance_to(now.saturating_duration_since(self.started_at))
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub timing: ChatTiming,
    pub idle_ttl: Duration,
    pub welcome_message: String,
    pub rng_seed: Option<u64>,
}

/// Live chat sessions, mapped onto wall-clock time.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    selector: Arc<ResponseSelector>,
    settings: StoreSettings,
    events_tx: broadcast::Sender<ChatEvent>,
    draws: AtomicU64,
}

impl SessionStore {
    pub fn new(selector: Arc<ResponseSelector>, settings: StoreSettings) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        Self {
            sessions: Mutex::new(HashMap::new()),
            selector,
            settings,
            events_tx,
            draws: AtomicU64::new(0),
        }
    }

    pub fn selector(&self) -> &ResponseSelector {
        &self.selector
    }

    /// A fresh random source. With a configured seed, each call gets the next
    /// seed in sequence so draws stay reproducible without repeating.
    pub fn randomness(&self) -> Box<dyn Randomness> {
        match self.settings.rng_seed {
            Some(seed) => {
                let n = self.draws.fetch_add(1, Ordering::Relaxed);
                Box::new(SeededRandomness::from_seed(seed.wrapping_add(n)))
            }
            None => Box::new(SeededRandomness::from_os()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create(&self) -> SessionView {
        let id = uuid::Uuid::new_v4().to_string();
        let rng = self.randomness();

        let session = ChatSession::new(id.clone(), Arc::clone(&self.selector), rng, self.settings.timing)
            .with_welcome(&self.settings.welcome_message);
        let view = session.view();

        let now = Instant::now();
        self.lock().insert(
            id.clone(),
            SessionEntry {
                session,
                started_at: now,
                last_activity: now,
            },
        );

        tracing::info!(session = %id, "chat session created");
        view
    }

    pub fn view(&self, id: &str) -> Result<SessionView, AppError> {
        let now = Instant::now();
        let (view, appended) = {
            let mut sessions = self.lock();
            let entry = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
            let appended = entry.catch_up(now);
            (entry.session.view(), appended)
        };
        self.publish(id, appended);
        Ok(view)
    }

    pub fn submit(&self, id: &str, text: &str) -> Result<SessionView, AppError> {
        let now = Instant::now();
        let (view, appended) = {
            let mut sessions = self.lock();
            let entry = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
            let mut appended = entry.catch_up(now);
            appended.push(entry.session.submit_user_message(text));
            entry.last_activity = now;
            (entry.session.view(), appended)
        };

        tracing::info!(session = %id, chars = text.chars().count(), "visitor message received");
        self.publish(id, appended);
        Ok(view)
    }

    pub fn set_open(&self, id: &str, open: bool) -> Result<SessionView, AppError> {
        let now = Instant::now();
        let (view, appended) = {
            let mut sessions = self.lock();
            let entry = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
            let appended = entry.catch_up(now);
            if open {
                entry.session.open();
            } else {
                entry.session.close();
            }
            entry.last_activity = now;
            (entry.session.view(), appended)
        };
        self.publish(id, appended);
        Ok(view)
    }

    /// Tears a session down, cancelling any reply still in flight.
    pub fn remove(&self, id: &str) -> Result<(), AppError> {
        let mut entry = self.lock().remove(id).ok_or_else(|| not_found(id))?;
        let dropped = entry.session.cancel_pending();
        tracing::info!(session = %id, dropped, "chat session closed");
        Ok(())
    }

    /// Advances every session to the current time and evicts idle ones.
    pub fn tick(&self) {
        let now = Instant::now();
        let mut published = Vec::new();
        let mut expired = 0usize;

        {
            let mut sessions = self.lock();
            for (id, entry) in sessions.iter_mut() {
                let appended = entry.catch_up(now);
                if !appended.is_empty() {
                    published.push((id.clone(), appended));
                }
            }

            sessions.retain(|id, entry| {
                let idle = now.saturating_duration_since(entry.last_activity);
                if idle < self.settings.idle_ttl || entry.session.pending_count() > 0 {
                    return true;
                }
                tracing::debug!(session = %id, idle_secs = idle.as_secs(), "evicting idle session");
                expired += 1;
                false
            });
        }

        if expired > 0 {
            tracing::info!(expired, "evicted idle chat sessions");
        }
        for (id, appended) in published {
            self.publish(&id, appended);
        }
    }

    fn publish(&self, id: &str, appended: Vec<ChatMessage>) {
        for message in appended {
            // no subscribers is fine
            let _ = self.events_tx.send(ChatEvent {
                session_id: id.to_string(),
                message,
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("chat session {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageKind, Sender};
    use crate::services::responder::KnowledgeBase;

    fn store(ttl: Duration) -> SessionStore {
        let selector = Arc::new(ResponseSelector::new(KnowledgeBase::builtin()).unwrap());
        SessionStore::new(
            selector,
            StoreSettings {
                timing: ChatTiming::default(),
                idle_ttl: ttl,
                welcome_message: "Welcome!".to_string(),
                rng_seed: Some(1),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_lands_after_real_delay() {
        let store = store(Duration::from_secs(1800));
        let id = store.create().session_id;

        let view = store.submit(&id, "Hi").unwrap();
        assert!(view.bot_typing);
        assert_eq!(view.messages.len(), 2);

        tokio::time::advance(Duration::from_millis(2001)).await;
        let view = store.view(&id).unwrap();
        assert!(!view.bot_typing);
        assert_eq!(view.messages.len(), 3);
        assert_eq!(view.messages[2].sender, Sender::Bot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_publishes_reply_and_nudge() {
        let store = store(Duration::from_secs(1800));
        let mut rx = store.subscribe();
        let id = store.create().session_id;
        store.submit(&id, "What is your pricing?").unwrap();

        let question = rx.recv().await.unwrap();
        assert_eq!(question.message.kind, MessageKind::Question);

        tokio::time::advance(Duration::from_secs(6)).await;
        store.tick();

        let reply = rx.recv().await.unwrap();
        let nudge = rx.recv().await.unwrap();
        assert_eq!(reply.session_id, id);
        assert!(matches!(reply.message.kind, MessageKind::Reply(_)));
        assert!(nudge.message.is_nudge());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted() {
        let store = store(Duration::from_secs(60));
        let id = store.create().session_id;
        store.create();
        assert_eq!(store.len(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        store.submit(&id, "hello").unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;
        store.tick();
        assert_eq!(store.len(), 1);
        assert!(store.view(&id).is_ok());
    }

    #[tokio::test]
    async fn test_remove_cancels_and_forgets() {
        let store = store(Duration::from_secs(1800));
        let id = store.create().session_id;
        store.submit(&id, "Hi").unwrap();
        store.remove(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.view(&id), Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(&id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_seeded_randomness_varies_between_calls() {
        let store = store(Duration::from_secs(1800));
        let replies: std::collections::HashSet<String> = (0..30)
            .map(|_| {
                let mut rng = store.randomness();
                store.selector().select_response("Hi", rng.as_mut()).text
            })
            .collect();
        assert!(replies.len() > 1, "seeded draws collapsed to {replies:?}");
    }

    #[tokio::test]
    async fn test_open_close_flag() {
        let store = store(Duration::from_secs(1800));
        let id = store.create().session_id;
        assert!(store.set_open(&id, true).unwrap().is_open);
        assert!(!store.set_open(&id, false).unwrap().is_open);
    }
}
