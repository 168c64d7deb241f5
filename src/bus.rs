use crate::chat::Message;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A message was appended to a session's log
    MessageAppended { session_id: Uuid, message: Message },

    /// The in-flight indicator flipped
    PendingChanged { session_id: Uuid, pending: bool },

    /// The widget was closed and the session discarded
    SessionClosed { session_id: Uuid },
}

impl SessionEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::MessageAppended { session_id, .. } => *session_id,
            SessionEvent::PendingChanged { session_id, .. } => *session_id,
            SessionEvent::SessionClosed { session_id } => *session_id,
        }
    }
}

pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // We ignore the error if there are no receivers
        let _ = self.tx.send(event);
    }
}
