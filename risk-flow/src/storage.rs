use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    dialogue::{DialogueSession, GREETING},
    error::Result,
    message::ChatMessage,
};

/// One open chat widget: its transcript and dialogue state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Last time the session was saved by a turn
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    pub transcript: Vec<ChatMessage>,
    pub dialogue: DialogueSession,
}

impl Session {
    /// Fresh session whose transcript starts with the greeting
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            transcript: vec![ChatMessage::assistant(GREETING)],
            dialogue: DialogueSession::new(),
        }
    }

    pub fn with_random_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Remove sessions last updated before `cutoff`, returning their ids
    async fn expire_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>>;
}

/// In-memory implementation of SessionStorage
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn expire_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.updated_at < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        // Re-checked on removal; a turn may have saved in between
        Ok(stale
            .into_iter()
            .filter(|id| {
                self.sessions
                    .remove_if(id, |_, session| session.updated_at < cutoff)
                    .is_some()
            })
            .collect())
    }
}
