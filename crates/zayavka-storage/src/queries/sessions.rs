// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state persistence.
//!
//! The session row is a JSON snapshot of [`SessionState`] keyed by chat
//! id. A missing or unreadable row decodes to [`SessionState::Idle`] --
//! handlers must tolerate session loss anyway, so a snapshot from an
//! older schema degrades to a fresh menu rather than an error.

use rusqlite::params;
use tracing::warn;
use zayavka_core::{ChatId, SessionState, ZayavkaError};

use crate::database::{map_tr_err, Database};

/// Load the session snapshot for a conversation.
pub async fn get_session(db: &Database, chat_id: ChatId) -> Result<SessionState, ZayavkaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT state FROM sessions WHERE chat_id = ?1")?;
            let mut rows = stmt.query(params![chat_id.0])?;
            match rows.next()? {
                Some(row) => {
                    let raw: String = row.get(0)?;
                    match serde_json::from_str(&raw) {
                        Ok(state) => Ok(state),
                        Err(e) => {
                            warn!(%chat_id, error = %e, "unreadable session snapshot, resetting");
                            Ok(SessionState::Idle)
                        }
                    }
                }
                None => Ok(SessionState::Idle),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Store the session snapshot for a conversation.
pub async fn put_session(
    db: &Database,
    chat_id: ChatId,
    state: &SessionState,
) -> Result<(), ZayavkaError> {
    let raw = serde_json::to_string(state).map_err(|e| ZayavkaError::Internal(e.to_string()))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (chat_id, state)
                 VALUES (?1, ?2)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     state = excluded.state,
                     updated_at = DATETIME('now', '+3 hours')",
                params![chat_id.0, raw],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use zayavka_core::{IntakeStep, Role, TicketDraft};

    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn missing_session_reads_as_idle() {
        let (db, _dir) = setup_db().await;
        let state = get_session(&db, ChatId(5)).await.unwrap();
        assert_eq!(state, SessionState::Idle);
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (db, _dir) = setup_db().await;
        let chat = ChatId(6);
        let state = SessionState::Intake {
            step: IntakeStep::EnterAddress,
            draft: TicketDraft::default(),
        };
        put_session(&db, chat, &state).await.unwrap();
        assert_eq!(get_session(&db, chat).await.unwrap(), state);
    }

    #[tokio::test]
    async fn put_overwrites_previous_state() {
        let (db, _dir) = setup_db().await;
        let chat = ChatId(7);
        put_session(&db, chat, &SessionState::MainMenu(Role::User))
            .await
            .unwrap();
        put_session(&db, chat, &SessionState::MainMenu(Role::Staff))
            .await
            .unwrap();
        assert_eq!(
            get_session(&db, chat).await.unwrap(),
            SessionState::MainMenu(Role::Staff)
        );
    }

    #[tokio::test]
    async fn corrupt_snapshot_degrades_to_idle() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO sessions (chat_id, state) VALUES (8, 'not json')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(get_session(&db, ChatId(8)).await.unwrap(), SessionState::Idle);
    }
}
