//! In-memory conversation histories, keyed by session identifier.
//!
//! Get-or-create semantics: the first message for an unknown session creates
//! an empty history. The map is bounded — least-recently-used sessions are
//! evicted past capacity, and idle sessions expire after a TTL — so it cannot
//! grow without limit over the process lifetime. Nothing here touches disk;
//! histories die with the process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::core::config::SessionConfig;
use crate::llm::ChatMessage;

struct SessionEntry {
    messages: Vec<ChatMessage>,
    last_used: Instant,
}

pub struct SessionMemory {
    entries: Mutex<HashMap<String, SessionEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl SessionMemory {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: config.capacity.max(1),
            ttl: Duration::from_secs(config.ttl_minutes * 60),
        }
    }

    /// Snapshot of the session's history, creating an empty one if absent.
    pub async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        let mut entries = self.entries.lock().await;
        self.prune(&mut entries);

        let entry = entries
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                messages: Vec::new(),
                last_used: Instant::now(),
            });
        entry.last_used = Instant::now();
        entry.messages.clone()
    }

    /// Appends one question/answer turn to the session's history.
    pub async fn append_turn(&self, session_id: &str, question: &str, answer: &str) {
        let mut entries = self.entries.lock().await;

        let entry = entries
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                messages: Vec::new(),
                last_used: Instant::now(),
            });
        entry.messages.push(ChatMessage::user(question));
        entry.messages.push(ChatMessage::assistant(answer));
        entry.last_used = Instant::now();

        self.prune(&mut entries);
    }

    pub async fn session_count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Drops expired sessions, then the least-recently-used ones past
    /// capacity.
    fn prune(&self, entries: &mut HashMap<String, SessionEntry>) {
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.last_used) <= self.ttl);

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                }
                None => break,
            }
        }
    }
}
