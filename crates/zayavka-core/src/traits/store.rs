// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence capabilities: profiles, tickets, and session state.

use async_trait::async_trait;

use crate::error::ZayavkaError;
use crate::session::{SessionState, TicketDraft};
use crate::types::{
    AttachmentParent, ChatId, Profile, ProfileDraft, ProfileId, Ticket, TicketId,
};

/// One row of the spreadsheet export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category: String,
    pub address: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
    pub assignee_name: Option<String>,
}

/// Identity resolver over stored profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn exists(&self, chat_id: ChatId) -> Result<bool, ZayavkaError>;

    async fn fetch(&self, chat_id: ChatId) -> Result<Option<Profile>, ZayavkaError>;

    /// Idempotent on `chat_id`: creates when absent, otherwise overwrites
    /// name/phone/email/role with the supplied values. The caller merges
    /// skip semantics before calling -- every draft field must be final.
    /// Duplicate phone across different participants surfaces
    /// [`ZayavkaError::Conflict`].
    async fn upsert(
        &self,
        chat_id: ChatId,
        username: Option<String>,
        draft: &ProfileDraft,
    ) -> Result<Profile, ZayavkaError>;
}

/// Ticket repository. All writes are auto-committing single statements;
/// no multi-statement transaction spans repository calls.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a confirmed draft with status=open. Returns the new
    /// monotonically increasing ticket id.
    async fn save_ticket(
        &self,
        requester: ProfileId,
        draft: &TicketDraft,
        assignee: ProfileId,
    ) -> Result<TicketId, ZayavkaError>;

    /// Fetch a ticket with its requester profile and attachments joined.
    async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, ZayavkaError>;

    /// One-way open -> closed transition.
    async fn set_status_closed(&self, id: TicketId) -> Result<(), ZayavkaError>;

    async fn save_attachment(
        &self,
        parent: AttachmentParent,
        locator: &str,
    ) -> Result<(), ZayavkaError>;

    /// Open-ticket counts per staff member, for observability and tests.
    async fn count_open_by_assignee(&self) -> Result<Vec<(ProfileId, u64)>, ZayavkaError>;

    /// The staff member with the fewest open tickets, ties broken by the
    /// oldest open-ticket timestamp (no open tickets sorts first).
    /// `None` when no staff profiles exist.
    async fn pick_assignee(&self) -> Result<Option<(ProfileId, ChatId)>, ZayavkaError>;

    /// Rows for the spreadsheet export, optionally filtered to tickets
    /// created at or after `since` (local-offset `YYYY-MM-DD HH:MM:SS`).
    async fn report_rows(&self, since: Option<&str>) -> Result<Vec<crate::traits::store::ReportRow>, ZayavkaError>;
}

/// Per-conversation session state, keyed by chat id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state, or [`SessionState::Idle`] when none is recorded.
    async fn get(&self, chat_id: ChatId) -> Result<SessionState, ZayavkaError>;

    async fn put(&self, chat_id: ChatId, state: SessionState) -> Result<(), ZayavkaError>;
}
