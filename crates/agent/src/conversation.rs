//! Volatile per-session chat history.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::llm::{ChatMessage, Role};

/// Session id sent by clients that want a fresh conversation.
pub const NEW_SESSION_SENTINEL: &str = "NEW";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses a client-supplied id; absent, blank or `"NEW"` means a new session.
    pub fn from_request(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some(NEW_SESSION_SENTINEL) => None,
            Some(id) => Some(Self(id.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct SessionStore {
    sessions: RwLock<Sessions>,
    history_limit: usize,
    max_sessions: usize,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<SessionId, SessionEntry>,
    clock: u64,
}

struct SessionEntry {
    messages: Vec<ChatMessage>,
    last_active: u64,
}

impl SessionStore {
    /// `history_limit` counts exchanges, each starting at a user message.
    /// Past `max_sessions`, recording a new session evicts the least recently active one.
    pub fn new(history_limit: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            history_limit: history_limit.max(1),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }

    pub async fn contains(&self, session: &SessionId) -> bool {
        self.sessions.read().await.entries.contains_key(session)
    }

    /// The replayable history of `session`; unknown sessions have none.
    pub async fn history(&self, session: &SessionId) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .entries
            .get(session)
            .map(|entry| entry.messages.clone())
            .unwrap_or_default()
    }

    /// Appends one finished exchange and drops the oldest exchanges beyond the limit.
    pub async fn record(&self, session: &SessionId, exchange: Vec<ChatMessage>) {
        let mut sessions = self.sessions.write().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if !sessions.entries.contains_key(session) && sessions.entries.len() >= self.max_sessions {
            if let Some(evicted) = sessions.least_recently_active() {
                sessions.entries.remove(&evicted);
                debug!(
                    event_name = "agent.session.evicted",
                    session_id = %evicted,
                    max_sessions = self.max_sessions,
                    "session cap reached, dropped least recently active session"
                );
            }
        }

        let entry = sessions
            .entries
            .entry(session.clone())
            .or_insert_with(|| SessionEntry { messages: Vec::new(), last_active: now });
        entry.last_active = now;
        entry.messages.extend(exchange);
        trim_to_exchanges(&mut entry.messages, self.history_limit);
    }

    pub async fn clear(&self, session: &SessionId) -> bool {
        self.sessions.write().await.entries.remove(session).is_some()
    }
}

impl Sessions {
    fn least_recently_active(&self) -> Option<SessionId> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_active)
            .map(|(session, _)| session.clone())
    }
}

fn trim_to_exchanges(history: &mut Vec<ChatMessage>, limit: usize) {
    let starts: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, message)| message.role == Role::User)
        .map(|(index, _)| index)
        .collect();

    if starts.len() > limit {
        let cut = starts[starts.len() - limit];
        history.drain(..cut);
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionId, SessionStore};
    use crate::llm::{ChatMessage, Role, ToolCall};

    fn exchange(turn: usize) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user(format!("question {turn}")),
            ChatMessage::assistant_tool_calls(None, vec![ToolCall::new("call", "get_available_cards", "{}")]),
            ChatMessage::tool_result("call", "{}"),
            ChatMessage::assistant(format!("answer {turn}")),
        ]
    }

    #[test]
    fn new_sentinel_and_blank_ids_start_fresh_sessions() {
        assert_eq!(SessionId::from_request(None), None);
        assert_eq!(SessionId::from_request(Some("NEW")), None);
        assert_eq!(SessionId::from_request(Some("  ")), None);
        assert_eq!(
            SessionId::from_request(Some("session_2")),
            Some(SessionId("session_2".to_string()))
        );
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[tokio::test]
    async fn history_keeps_only_the_latest_exchanges() {
        let store = SessionStore::new(2, 100);
        let session = SessionId::generate();

        for turn in 0..4 {
            store.record(&session, exchange(turn)).await;
        }

        let history = store.history(&session).await;
        assert_eq!(history.len(), 8);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content.as_deref(), Some("question 2"));
        assert_eq!(history[7].content.as_deref(), Some("answer 3"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new(15, 100);
        let first = SessionId("a".to_string());
        let second = SessionId("b".to_string());

        store.record(&first, exchange(0)).await;

        assert!(store.contains(&first).await);
        assert!(store.history(&second).await.is_empty());
        assert_eq!(store.len().await, 1);
        assert!(store.clear(&first).await);
        assert!(!store.contains(&first).await);
    }

    #[tokio::test]
    async fn session_count_is_capped_by_evicting_the_least_recently_active() {
        let store = SessionStore::new(15, 2);
        let (a, b, c) = (SessionId("a".into()), SessionId("b".into()), SessionId("c".into()));

        store.record(&a, exchange(0)).await;
        store.record(&b, exchange(0)).await;
        store.record(&a, exchange(1)).await;
        store.record(&c, exchange(0)).await;

        assert_eq!(store.len().await, 2);
        assert!(!store.contains(&b).await);
        assert_eq!(store.history(&a).await.len(), 8);
        assert!(store.contains(&c).await);

        for turn in 0..50 {
            store.record(&SessionId(format!("client-{turn}")), exchange(turn)).await;
        }
        assert_eq!(store.len().await, store.max_sessions());
    }
}
