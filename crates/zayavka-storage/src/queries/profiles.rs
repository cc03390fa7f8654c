// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile CRUD operations.

use std::str::FromStr;

use rusqlite::params;
use zayavka_core::{ChatId, Profile, ProfileDraft, ProfileId, Role, ZayavkaError};

use crate::database::{map_tr_err, other_err, Database};

pub(crate) fn profile_from_row(row: &rusqlite::Row<'_>) -> Result<Profile, tokio_rusqlite::Error> {
    let role: String = row.get(6)?;
    Ok(Profile {
        id: ProfileId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        username: row.get(2)?,
        full_name: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        role: Role::from_str(&role).map_err(other_err)?,
    })
}

const PROFILE_COLUMNS: &str = "id, chat_id, username, full_name, phone, email, role";

/// Whether a profile exists for the external participant id.
pub async fn exists(db: &Database, chat_id: ChatId) -> Result<bool, ZayavkaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT 1 FROM profiles WHERE chat_id = ?1")?;
            Ok(stmt.exists(params![chat_id.0])?)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a profile by external participant id.
pub async fn fetch(db: &Database, chat_id: ChatId) -> Result<Option<Profile>, ZayavkaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE chat_id = ?1"
            ))?;
            let mut rows = stmt.query(params![chat_id.0])?;
            match rows.next()? {
                Some(row) => Ok(Some(profile_from_row(row)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a profile by internal id.
pub async fn fetch_by_id(db: &Database, id: ProfileId) -> Result<Option<Profile>, ZayavkaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"
            ))?;
            let mut rows = stmt.query(params![id.0])?;
            match rows.next()? {
                Some(row) => Ok(Some(profile_from_row(row)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create or overwrite the profile for `chat_id`.
///
/// All draft fields must be final -- skip/keep merging happens in the
/// registration protocol before this call. A phone number already stored
/// for a different participant surfaces as [`ZayavkaError::Conflict`].
pub async fn upsert(
    db: &Database,
    chat_id: ChatId,
    username: Option<String>,
    draft: &ProfileDraft,
) -> Result<Profile, ZayavkaError> {
    let full_name = draft.full_name.clone().unwrap_or_default();
    let phone = draft.phone.clone();
    let email = draft.email.clone();
    let role = draft.role.unwrap_or(Role::User).to_string();

    let result = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (chat_id, username, full_name, phone, email, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(chat_id) DO UPDATE SET
                     username = excluded.username,
                     full_name = excluded.full_name,
                     phone = excluded.phone,
                     email = excluded.email,
                     role = excluded.role",
                params![chat_id.0, username, full_name, phone, email, role],
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE chat_id = ?1"
            ))?;
            let mut rows = stmt.query(params![chat_id.0])?;
            match rows.next()? {
                Some(row) => Ok(profile_from_row(row)?),
                None => Err(tokio_rusqlite::Error::Rusqlite(
                    rusqlite::Error::QueryReturnedNoRows,
                )),
            }
        })
        .await;

    match result {
        Ok(profile) => Ok(profile),
        Err(e) if is_phone_conflict(&e) => Err(ZayavkaError::Conflict(
            "этот номер телефона уже привязан к другому пользователю".into(),
        )),
        Err(e) => Err(map_tr_err(e)),
    }
}

/// Detect the `profiles.phone` unique-constraint violation.
fn is_phone_conflict(e: &tokio_rusqlite::Error) -> bool {
    matches!(
        e,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(err, Some(msg)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("profiles.phone")
    )
}
