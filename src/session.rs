use crate::agent::client::AnswerBackend;
use crate::bus::{EventBus, SessionEvent};
use crate::chat::{Message, StructuredResponse};
use crate::corpus::Corpus;
use crate::reveal::RevealHandle;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Seed suggestion chips shown before the first exchange. Activating one is
/// just `submit(chip)`, the same contract as typed input.
pub const SEED_CHIPS: [&str; 6] = [
    "Looking for smarter insurance with VISoF?",
    "Ready to optimize fleets with Fleetrobo?",
    "Streamlining compliance with GSTrobo?",
    "Exploring AI Products for growth?",
    "Planning digital transformation (DX)?",
    "Aiming to innovate with EdTech?",
];

/// Whether the pre-supplied first query has fired yet. An explicit state
/// rather than a flag, so auto-submit cannot re-trigger no matter how often
/// the surrounding shell re-enters.
#[derive(Debug, Clone, PartialEq)]
enum InitialQuery {
    Pending(String),
    Consumed,
}

struct Session {
    messages: Vec<Message>,
    pending: bool,
    composer: String,
    initial: InitialQuery,
    reveals: Vec<RevealHandle>,
}

/// Everything the view layer needs to render a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub messages: Vec<Message>,
    pub pending: bool,
    pub composer: String,
    pub chips: Vec<String>,
}

/// The conversation response engine: owns every session's append-only
/// message log and in-flight status, and orchestrates the answer calls.
///
/// All mutation goes through `open`, `submit`, `set_composer` and `close`;
/// everything else is observation. Cheap to clone, internally shared.
#[derive(Clone)]
pub struct Engine {
    backend: Arc<dyn AnswerBackend>,
    corpus: Corpus,
    bus: Arc<EventBus>,
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl Engine {
    pub fn new(backend: Arc<dyn AnswerBackend>, corpus: Corpus, bus: Arc<EventBus>) -> Self {
        Self {
            backend,
            corpus,
            bus,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a session for a freshly opened widget. A pre-supplied initial
    /// query is submitted exactly once, here and never again.
    pub fn open(&self, initial_query: Option<String>) -> Uuid {
        let id = Uuid::new_v4();

        {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.insert(
                id,
                Session {
                    messages: Vec::new(),
                    pending: false,
                    composer: String::new(),
                    initial: match initial_query {
                        Some(q) => InitialQuery::Pending(q),
                        None => InitialQuery::Consumed,
                    },
                    reveals: Vec::new(),
                },
            );
        }

        info!("Session {} opened", id);
        self.consume_initial_query(id);
        id
    }

    /// Fire the pending initial query if there is one. Idempotent: the
    /// Pending -> Consumed transition happens under the lock, so repeated
    /// invocation can never produce a duplicate first turn.
    pub fn consume_initial_query(&self, session_id: Uuid) {
        let query = {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.get_mut(&session_id) else {
                return;
            };
            match std::mem::replace(&mut session.initial, InitialQuery::Consumed) {
                InitialQuery::Pending(q) => Some(q),
                InitialQuery::Consumed => None,
            }
        };

        if let Some(q) = query {
            if let Err(e) = self.submit(session_id, &q) {
                debug!("Initial query for session {} dropped: {}", session_id, e);
            }
        }
    }

    /// Submit a user query. Empty input and input while an answer is already
    /// in flight are ignored without error; an accepted query appends the
    /// user turn, clears the composer and resolves asynchronously into a bot
    /// turn. Errs only for an unknown session.
    pub fn submit(&self, session_id: Uuid, query: &str) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring empty query for session {}", session_id);
            return Ok(());
        }

        let message = {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .get_mut(&session_id)
                .ok_or_else(|| anyhow!("Unknown session {}", session_id))?;

            if session.pending {
                debug!(
                    "Session {} already awaiting an answer, dropping submit",
                    session_id
                );
                return Ok(());
            }

            let message = Message::user(query);
            session.messages.push(message.clone());
            session.composer.clear();
            session.pending = true;
            message
        };

        self.bus.publish(SessionEvent::MessageAppended {
            session_id,
            message,
        });
        self.bus.publish(SessionEvent::PendingChanged {
            session_id,
            pending: true,
        });

        let engine = self.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            let answer = engine
                .backend
                .fetch_answer(&query, engine.corpus.text())
                .await;
            engine.complete(session_id, answer);
        });

        Ok(())
    }

    /// Append the bot turn for a resolved submit. An answer for a session
    /// closed in the meantime is discarded.
    fn complete(&self, session_id: Uuid, answer: StructuredResponse) {
        let message = {
            let mut sessions = self.sessions.lock().unwrap();
            let Some(session) = sessions.get_mut(&session_id) else {
                debug!("Discarding answer for closed session {}", session_id);
                return;
            };

            let message = Message::bot(answer);
            session.messages.push(message.clone());
            session.pending = false;
            message
        };

        self.bus.publish(SessionEvent::MessageAppended {
            session_id,
            message,
        });
        self.bus.publish(SessionEvent::PendingChanged {
            session_id,
            pending: false,
        });
    }

    /// Mirror the composer draft text.
    pub fn set_composer(&self, session_id: Uuid, text: String) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| anyhow!("Unknown session {}", session_id))?;
        session.composer = text;
        Ok(())
    }

    pub fn snapshot(&self, session_id: Uuid) -> Option<SessionView> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(&session_id).map(|session| SessionView {
            messages: session.messages.clone(),
            pending: session.pending,
            composer: session.composer.clone(),
            chips: SEED_CHIPS.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Look up one message, for reveal playback.
    pub fn message(&self, session_id: Uuid, message_id: Uuid) -> Option<Message> {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(&session_id)?
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    /// Track a reveal playback so closing the widget can cancel it.
    pub fn register_reveal(&self, session_id: Uuid, handle: RevealHandle) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| anyhow!("Unknown session {}", session_id))?;
        session.reveals.retain(|h| !h.is_cancelled());
        session.reveals.push(handle);
        Ok(())
    }

    /// Discard a session. Active reveals are cancelled immediately; an
    /// in-flight remote call is left to finish and its result dropped.
    pub fn close(&self, session_id: Uuid) -> Result<()> {
        let session = {
            let mut sessions = self.sessions.lock().unwrap();
            sessions
                .remove(&session_id)
                .ok_or_else(|| anyhow!("Unknown session {}", session_id))?
        };

        for handle in &session.reveals {
            handle.cancel();
        }

        info!("Session {} closed", session_id);
        self.bus.publish(SessionEvent::SessionClosed { session_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use crate::fallback;
    use async_trait::async_trait;
    use std::time::Duration;

    impl SessionView {
        fn user_turns(&self) -> usize {
            self.messages.iter().filter(|m| m.role == Role::User).count()
        }

        fn bot_turns(&self) -> usize {
            self.messages.iter().filter(|m| m.role == Role::Bot).count()
        }
    }

    /// Stands in for the real client after a remote failure: resolves every
    /// query to the canned generator, which is exactly the client's contract.
    struct CannedBackend;

    #[async_trait]
    impl AnswerBackend for CannedBackend {
        async fn fetch_answer(&self, query: &str, _corpus: &str) -> StructuredResponse {
            fallback::select(query)
        }
    }

    /// Holds the answer for a simulated second, so tests can observe the
    /// Awaiting state deterministically under the paused clock.
    struct SlowBackend;

    #[async_trait]
    impl AnswerBackend for SlowBackend {
        async fn fetch_answer(&self, query: &str, _corpus: &str) -> StructuredResponse {
            tokio::time::sleep(Duration::from_secs(1)).await;
            fallback::select(query)
        }
    }

    fn engine(backend: Arc<dyn AnswerBackend>) -> Engine {
        Engine::new(backend, Corpus::from_text("corpus"), Arc::new(EventBus::new()))
    }

    async fn wait_idle(engine: &Engine, id: Uuid) {
        for _ in 0..500 {
            if !engine.snapshot(id).unwrap().pending {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never left the awaiting state");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_appends_user_then_bot_turn() {
        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(None);

        engine.submit(id, "insurance claims").unwrap();
        let view = engine.snapshot(id).unwrap();
        assert!(view.pending);
        assert_eq!(view.user_turns(), 1);
        assert_eq!(view.composer, "");

        wait_idle(&engine, id).await;
        let view = engine.snapshot(id).unwrap();
        assert_eq!(view.messages.len(), 2);
        assert_eq!(view.messages[0].role, Role::User);
        assert_eq!(view.messages[1].role, Role::Bot);
        let answer = view.messages[1].structured.as_ref().unwrap();
        assert_eq!(answer.related[0].title, "AI in Insurance: A Whitepaper");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_queries_are_ignored() {
        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(None);

        engine.submit(id, "").unwrap();
        engine.submit(id, "   \n\t ").unwrap();

        let view = engine.snapshot(id).unwrap();
        assert!(view.messages.is_empty());
        assert!(!view.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_awaiting_is_dropped() {
        let engine = engine(Arc::new(SlowBackend));
        let id = engine.open(None);

        engine.submit(id, "insurance claims").unwrap();
        engine.submit(id, "insurance claims").unwrap();

        let view = engine.snapshot(id).unwrap();
        assert_eq!(view.user_turns(), 1);

        wait_idle(&engine, id).await;
        let view = engine.snapshot(id).unwrap();
        assert_eq!(view.user_turns(), 1);
        assert_eq!(view.bot_turns(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn log_is_append_only_across_turns() {
        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(None);

        engine.submit(id, "first question").unwrap();
        wait_idle(&engine, id).await;
        let after_first = engine.snapshot(id).unwrap().messages;

        engine.submit(id, "second question").unwrap();
        wait_idle(&engine, id).await;
        let after_second = engine.snapshot(id).unwrap().messages;

        assert!(after_second.len() > after_first.len());
        for (before, after) in after_first.iter().zip(after_second.iter()) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.content, after.content);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initial_query_fires_exactly_once() {
        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(Some("How can fleet tracking help?".to_string()));

        // A shell re-render re-entering the consume path must not duplicate
        // the first turn.
        engine.consume_initial_query(id);
        engine.consume_initial_query(id);

        wait_idle(&engine, id).await;
        let view = engine.snapshot(id).unwrap();
        assert_eq!(view.user_turns(), 1);
        assert_eq!(view.bot_turns(), 1);
        let answer = view.messages[1].structured.as_ref().unwrap();
        assert_eq!(answer.related[0].title, "Fleet Telematics Dashboard Demo");
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_for_closed_session_is_discarded() {
        let bus = Arc::new(EventBus::new());
        let engine = Engine::new(Arc::new(SlowBackend), Corpus::from_text("corpus"), bus.clone());
        let mut events = bus.subscribe();

        let id = engine.open(None);
        engine.submit(id, "fleet tracking").unwrap();
        engine.close(id).unwrap();

        // Let the in-flight answer resolve against the removed session.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.snapshot(id).is_none());

        let mut saw_closed = false;
        while let Ok(event) = events.try_recv() {
            if saw_closed {
                assert!(
                    !matches!(event, SessionEvent::MessageAppended { .. }),
                    "no message may be appended after the session closed"
                );
            }
            if matches!(event, SessionEvent::SessionClosed { .. }) {
                saw_closed = true;
            }
        }
        assert!(saw_closed);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_registered_reveals() {
        use crate::reveal::{RevealPlayer, RevealSchedule};

        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(None);

        let schedule = RevealSchedule::plan(&fallback::select("anything"));
        let (mut player, handle) = RevealPlayer::new(schedule);
        engine.register_reveal(id, handle).unwrap();

        engine.close(id).unwrap();
        assert_eq!(player.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn full_exchange_supports_reveal_playback() {
        use crate::reveal::{RevealEvent, RevealPlayer, RevealSchedule};

        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(Some("How can fleet tracking help?".to_string()));
        wait_idle(&engine, id).await;

        let view = engine.snapshot(id).unwrap();
        let bot = &view.messages[1];
        let answer = bot.structured.as_ref().unwrap();

        let (mut player, handle) = RevealPlayer::new(RevealSchedule::plan(answer));
        engine.register_reveal(id, handle).unwrap();

        let mut intro = String::new();
        while let Some(event) = player.next_event().await {
            if let RevealEvent::Char { ch } = event {
                intro.push(ch);
            }
        }
        assert_eq!(intro, answer.intro);
        assert_eq!(intro, bot.content);
    }

    #[tokio::test(start_paused = true)]
    async fn composer_mirrors_draft_and_clears_on_submit() {
        let engine = engine(Arc::new(CannedBackend));
        let id = engine.open(None);

        engine.set_composer(id, "dra".to_string()).unwrap();
        engine.set_composer(id, "draft".to_string()).unwrap();
        assert_eq!(engine.snapshot(id).unwrap().composer, "draft");

        engine.submit(id, "draft").unwrap();
        assert_eq!(engine.snapshot(id).unwrap().composer, "");
    }
}
