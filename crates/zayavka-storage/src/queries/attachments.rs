// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment persistence.
//!
//! The exactly-one-parent invariant is enforced twice: by
//! [`zayavka_core::AttachmentParent`] in the type system and by the SQL
//! CHECK constraint for anything that bypasses the Rust API.

use rusqlite::params;
use zayavka_core::{AttachmentParent, ZayavkaError};

use crate::database::{map_tr_err, Database};

/// Record a committed media file under its parent ticket or reply.
pub async fn save_attachment(
    db: &Database,
    parent: AttachmentParent,
    locator: &str,
) -> Result<(), ZayavkaError> {
    let (ticket_ref, reply_ref) = parent.as_refs();
    let locator = locator.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO attachments (ticket_id, reply_ticket_id, locator)
                 VALUES (?1, ?2, ?3)",
                params![ticket_ref, reply_ref, locator],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use zayavka_core::{Category, ChatId, ProfileDraft, Role, TicketDraft, TicketId};

    use super::*;
    use crate::queries::{profiles, tickets};
    use tempfile::tempdir;

    async fn setup_ticket() -> (Database, tempfile::TempDir, TicketId) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attachments.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let user = profiles::upsert(
            &db,
            ChatId(1),
            None,
            &ProfileDraft {
                full_name: Some("П".into()),
                role: Some(Role::User),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;
        let staff = profiles::upsert(
            &db,
            ChatId(2),
            None,
            &ProfileDraft {
                full_name: Some("О".into()),
                role: Some(Role::Staff),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;
        let id = tickets::save_ticket(
            &db,
            user,
            &TicketDraft {
                category: Some(Category::Other),
                address: Some("а".into()),
                media: None,
                description: Some("о".into()),
            },
            staff,
        )
        .await
        .unwrap();
        (db, dir, id)
    }

    #[tokio::test]
    async fn saves_under_either_parent() {
        let (db, _dir, id) = setup_ticket().await;
        save_attachment(&db, AttachmentParent::Ticket(id), "t.jpg")
            .await
            .unwrap();
        save_attachment(&db, AttachmentParent::Reply(id), "r.mp4")
            .await
            .unwrap();

        let ticket = tickets::fetch_ticket(&db, id).await.unwrap().unwrap();
        assert_eq!(ticket.attachments.len(), 2);
    }

    #[tokio::test]
    async fn sql_check_rejects_rows_with_no_parent() {
        let (db, _dir, _id) = setup_ticket().await;
        let result = db
            .connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO attachments (ticket_id, reply_ticket_id, locator)
                     VALUES (NULL, NULL, 'orphan.jpg')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err(), "CHECK constraint must reject orphans");
    }

    #[tokio::test]
    async fn sql_check_rejects_rows_with_both_parents() {
        let (db, _dir, id) = setup_ticket().await;
        let result = db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO attachments (ticket_id, reply_ticket_id, locator)
                     VALUES (?1, ?1, 'double.jpg')",
                    params![id.0],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err(), "CHECK constraint must reject dual parents");
    }
}
