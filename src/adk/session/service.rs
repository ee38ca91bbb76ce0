// SPDX-License-Identifier: MIT

use super::Session;
use crate::adk::error::SessionError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, lockable handle to one session
pub type SessionHandle = Arc<RwLock<Session>>;

/// Keeps sessions in process memory; nothing survives a restart
#[derive(Clone, Default)]
pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session; a random id is assigned when none is given
    pub async fn create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
    ) -> Result<SessionHandle, SessionError> {
        let id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut sessions = self.sessions.write().await;
        match sessions.entry(id) {
            Entry::Occupied(entry) => Err(SessionError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                log::debug!("Created session {} for app {}", entry.key(), app_name);
                let session = Session::new(entry.key().clone(), app_name, user_id);
                Ok(entry.insert(Arc::new(RwLock::new(session))).clone())
            }
        }
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Return the existing session or create one under that id
    pub async fn get_or_create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> SessionHandle {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with_key(|id| {
                log::debug!("Created session {} for app {}", id, app_name);
                Arc::new(RwLock::new(Session::new(id.clone(), app_name, user_id)))
            })
            .clone()
    }
}
