// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket repository operations, including the assignment-ranking query.

use std::str::FromStr;

use rusqlite::params;
use zayavka_core::{
    Attachment, AttachmentParent, Category, ChatId, ProfileId, ReportRow, Ticket, TicketDraft,
    TicketId, TicketStatus, ZayavkaError,
};

use crate::database::{map_tr_err, other_err, Database};
use crate::queries::profiles::profile_from_row;

/// Persist a confirmed draft with status=open and a fixed assignee.
/// Returns the repository-assigned, monotonically increasing id.
pub async fn save_ticket(
    db: &Database,
    requester: ProfileId,
    draft: &TicketDraft,
    assignee: ProfileId,
) -> Result<TicketId, ZayavkaError> {
    let category = draft
        .category
        .ok_or_else(|| ZayavkaError::Internal("ticket draft has no category".into()))?
        .to_string();
    let address = draft
        .address
        .clone()
        .ok_or_else(|| ZayavkaError::Internal("ticket draft has no address".into()))?;
    let description = draft
        .description
        .clone()
        .ok_or_else(|| ZayavkaError::Internal("ticket draft has no description".into()))?;

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tickets (requester_id, assignee_id, category, address, description, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'open')",
                params![requester.0, assignee.0, category, address, description],
            )?;
            Ok(TicketId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a ticket with its requester profile and all attachments
/// (the ticket's own media and any reply media) joined in.
pub async fn fetch_ticket(db: &Database, id: TicketId) -> Result<Option<Ticket>, ZayavkaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.assignee_id, t.category, t.address, t.description,
                        t.status, t.created_at,
                        u.id, u.chat_id, u.username, u.full_name, u.phone, u.email, u.role
                 FROM tickets t
                 JOIN profiles u ON t.requester_id = u.id
                 WHERE t.id = ?1",
            )?;
            let mut rows = stmt.query(params![id.0])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };

            let assignee: Option<i64> = row.get(1)?;
            let category: String = row.get(2)?;
            let status: String = row.get(5)?;
            let requester = {
                // Columns 7.. are the profile columns in canonical order.
                let role: String = row.get(13)?;
                zayavka_core::Profile {
                    id: ProfileId(row.get(7)?),
                    chat_id: ChatId(row.get(8)?),
                    username: row.get(9)?,
                    full_name: row.get(10)?,
                    phone: row.get(11)?,
                    email: row.get(12)?,
                    role: zayavka_core::Role::from_str(&role).map_err(other_err)?,
                }
            };

            let mut ticket = Ticket {
                id: TicketId(row.get(0)?),
                requester,
                assignee: ProfileId(assignee.ok_or_else(|| {
                    other_err(std::io::Error::other("ticket row has no assignee"))
                })?),
                category: Category::from_str(&category).map_err(other_err)?,
                address: row.get(3)?,
                description: row.get(4)?,
                status: TicketStatus::from_str(&status).map_err(other_err)?,
                created_at: row.get(6)?,
                attachments: Vec::new(),
            };
            drop(rows);
            drop(stmt);

            let mut stmt = conn.prepare(
                "SELECT id, ticket_id, reply_ticket_id, locator, created_at
                 FROM attachments
                 WHERE ticket_id = ?1 OR reply_ticket_id = ?1
                 ORDER BY id",
            )?;
            let mut rows = stmt.query(params![id.0])?;
            while let Some(row) = rows.next()? {
                let parent = AttachmentParent::from_refs(row.get(1)?, row.get(2)?)
                    .map_err(other_err)?;
                ticket.attachments.push(Attachment {
                    id: row.get(0)?,
                    parent,
                    locator: row.get(3)?,
                    created_at: row.get(4)?,
                });
            }

            Ok(Some(ticket))
        })
        .await
        .map_err(map_tr_err)
}

/// One-way open -> closed transition.
pub async fn set_status_closed(db: &Database, id: TicketId) -> Result<(), ZayavkaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tickets SET status = 'closed' WHERE id = ?1",
                params![id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Open-ticket counts grouped by assignee.
pub async fn count_open_by_assignee(
    db: &Database,
) -> Result<Vec<(ProfileId, u64)>, ZayavkaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT assignee_id, COUNT(*)
                 FROM tickets
                 WHERE status = 'open' AND assignee_id IS NOT NULL
                 GROUP BY assignee_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((ProfileId(row.get(0)?), row.get::<_, i64>(1)? as u64))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

/// The staff member with the fewest open tickets.
///
/// Ties are broken by the oldest open-ticket timestamp ascending; staff
/// with no open tickets sort first via the epoch sentinel, which is
/// earlier than any real recorded timestamp.
pub async fn pick_assignee(db: &Database) -> Result<Option<(ProfileId, ChatId)>, ZayavkaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.chat_id
                 FROM profiles p
                 LEFT JOIN tickets t ON t.assignee_id = p.id AND t.status = 'open'
                 WHERE p.role = 'staff'
                 GROUP BY p.id
                 ORDER BY COUNT(t.id) ASC,
                          COALESCE(MIN(t.created_at), '1970-01-01 00:00:00') ASC
                 LIMIT 1",
            )?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Ok(Some((ProfileId(row.get(0)?), ChatId(row.get(1)?)))),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Rows for the spreadsheet export, newest first is not wanted here --
/// report consumers expect ticket-id order.
pub async fn report_rows(
    db: &Database,
    since: Option<&str>,
) -> Result<Vec<ReportRow>, ZayavkaError> {
    let since = since.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let base = "SELECT t.id, u.full_name, u.phone, u.email, t.category, t.address,
                               t.description, t.status, t.created_at, a.full_name
                        FROM tickets t
                        JOIN profiles u ON t.requester_id = u.id
                        LEFT JOIN profiles a ON t.assignee_id = a.id";
            let map_row = |row: &rusqlite::Row<'_>| {
                Ok(ReportRow {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    phone: row.get(2)?,
                    email: row.get(3)?,
                    category: row.get(4)?,
                    address: row.get(5)?,
                    description: row.get(6)?,
                    status: row.get(7)?,
                    created_at: row.get(8)?,
                    assignee_name: row.get(9)?,
                })
            };

            let mut out = Vec::new();
            match &since {
                Some(since) => {
                    let mut stmt =
                        conn.prepare(&format!("{base} WHERE t.created_at >= ?1 ORDER BY t.id"))?;
                    let rows = stmt.query_map(params![since], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!("{base} ORDER BY t.id"))?;
                    let rows = stmt.query_map([], map_row)?;
                    for row in rows {
                        out.push(row?);
                    }
                }
            }
            Ok(out)
        })
        .await
        .map_err(map_tr_err)
}
