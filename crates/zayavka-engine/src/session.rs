// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session store.
//!
//! Sessions are per-conversation scratch state; losing them on restart is
//! acceptable because every handler re-derives the menu from the profile
//! repository when it finds [`SessionState::Idle`]. Deployments that want
//! sessions to survive restarts use the sqlite-backed store instead.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zayavka_core::{ChatId, SessionState, SessionStore, ZayavkaError};

/// Mutex-guarded map of chat id to protocol state.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    states: Mutex<HashMap<ChatId, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Result<SessionState, ZayavkaError> {
        Ok(self
            .states
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, chat_id: ChatId, state: SessionState) -> Result<(), ZayavkaError> {
        self.states.lock().await.insert(chat_id, state);
        Ok(())
    }
}
