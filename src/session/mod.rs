//! Conversation sessions.
//!
//! Sessions live in memory and keep only the most recent exchanges, so the
//! history sent to the model stays small.

use crate::error::{Result, SyllabusError};
use crate::llm::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Default number of sessions kept before the least recently used is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Default)]
struct Session {
    turns: Vec<ConversationTurn>,
    last_used: u64,
}

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, Session>,
    clock: u64,
}

impl SessionTable {
    /// The session for `id`, created if missing and marked as just used.
    /// Creating a session beyond `max_sessions` evicts the least recently
    /// used one.
    fn touch(&mut self, id: &str, max_sessions: usize) -> &mut Session {
        self.clock += 1;
        if !self.sessions.contains_key(id) {
            while self.sessions.len() >= max_sessions.max(1) {
                let Some(oldest) = self
                    .sessions
                    .iter()
                    .min_by_key(|(_, s)| s.last_used)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                self.sessions.remove(&oldest);
                debug!("Evicted idle session {}", oldest);
            }
        }
        let session = self.sessions.entry(id.to_string()).or_default();
        session.last_used = self.clock;
        session
    }
}

/// Keyed, size-bounded conversation histories.
pub struct SessionManager {
    table: Mutex<SessionTable>,
    counter: AtomicU64,
    /// Exchanges kept per session; each exchange is two turns.
    max_history: usize,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            table: Mutex::new(SessionTable::default()),
            counter: AtomicU64::new(0),
            max_history,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Limit how many sessions are kept at once.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("session_{}", n);
        if let Ok(mut table) = self.lock() {
            table.touch(&id, self.max_sessions);
        }
        debug!("Created session {}", id);
        id
    }

    /// Append a turn, creating the session if it does not exist yet.
    pub fn add_turn(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let max_turns = self.max_history * 2;
        let mut table = self.lock()?;
        let turns = &mut table.touch(session_id, self.max_sessions).turns;
        turns.push(ConversationTurn::new(role, content));
        if turns.len() > max_turns {
            let excess = turns.len() - max_turns;
            turns.drain(..excess);
        }
        Ok(())
    }

    /// Append a question and its answer.
    pub fn add_exchange(&self, session_id: &str, question: &str, answer: &str) -> Result<()> {
        self.add_turn(session_id, Role::User, question)?;
        self.add_turn(session_id, Role::Assistant, answer)
    }

    /// History rendered for the model, one `User:`/`Assistant:` line per
    /// turn. `None` for unknown or empty sessions.
    pub fn history(&self, session_id: &str) -> Option<String> {
        let mut table = self.lock().ok()?;
        if !table.sessions.contains_key(session_id) {
            return None;
        }
        let turns = &table.touch(session_id, self.max_sessions).turns;
        if turns.is_empty() {
            return None;
        }
        Some(
            turns
                .iter()
                .map(|t| {
                    let speaker = match t.role {
                        Role::User => "User",
                        Role::Assistant => "Assistant",
                    };
                    format!("{}: {}", speaker, t.content)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Forget everything said in a session.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        if let Some(session) = self.lock()?.sessions.get_mut(session_id) {
            session.turns.clear();
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionTable>> {
        self.table
            .lock()
            .map_err(|e| SyllabusError::Session(format!("Failed to acquire lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let manager = SessionManager::new(2);
        let a = manager.create_session();
        let b = manager.create_session();
        assert_eq!(a, "session_1");
        assert_eq!(b, "session_2");
        assert!(manager.history(&a).is_none());
    }

    #[test]
    fn test_history_rendering() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        manager.add_exchange(&id, "What is MCP?", "A protocol.").unwrap();

        assert_eq!(
            manager.history(&id).unwrap(),
            "User: What is MCP?\nAssistant: A protocol."
        );
    }

    #[test]
    fn test_history_is_truncated_to_recent_exchanges() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        for i in 1..=3 {
            manager
                .add_exchange(&id, &format!("q{}", i), &format!("a{}", i))
                .unwrap();
        }

        assert_eq!(
            manager.history(&id).unwrap(),
            "User: q2\nAssistant: a2\nUser: q3\nAssistant: a3"
        );
    }

    #[test]
    fn test_unknown_session_is_created_on_write() {
        let manager = SessionManager::new(1);
        assert!(manager.history("custom").is_none());
        manager.add_turn("custom", Role::User, "hi").unwrap();
        assert_eq!(manager.history("custom").unwrap(), "User: hi");
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        manager.add_exchange(&id, "q", "a").unwrap();
        manager.clear_session(&id).unwrap();
        assert!(manager.history(&id).is_none());

        manager.add_exchange(&id, "q2", "a2").unwrap();
        assert_eq!(manager.history(&id).unwrap(), "User: q2\nAssistant: a2");
    }

    #[test]
    fn test_least_recently_used_session_is_evicted() {
        let manager = SessionManager::new(2).with_max_sessions(2);
        let a = manager.create_session();
        let b = manager.create_session();
        manager.add_exchange(&a, "qa", "aa").unwrap();
        manager.add_exchange(&b, "qb", "ab").unwrap();

        // Reading a session counts as use, leaving `b` the oldest.
        assert!(manager.history(&a).is_some());
        let c = manager.create_session();
        manager.add_exchange(&c, "qc", "ac").unwrap();

        assert!(manager.history(&b).is_none());
        assert_eq!(manager.history(&a).unwrap(), "User: qa\nAssistant: aa");
        assert_eq!(manager.history(&c).unwrap(), "User: qc\nAssistant: ac");
    }
}
