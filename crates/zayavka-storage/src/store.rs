// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the persistence capability traits.

use std::sync::Arc;

use async_trait::async_trait;

use zayavka_core::{
    AttachmentParent, ChatId, Profile, ProfileDraft, ProfileId, ReportRow, SessionState,
    SessionStore, Ticket, TicketDraft, TicketId, ZayavkaError,
};
use zayavka_core::{ProfileStore, TicketStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store implementing [`ProfileStore`], [`TicketStore`],
/// and [`SessionStore`] over one shared [`Database`] handle.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    /// Open the database at `path` and wrap it.
    pub async fn open(path: &str) -> Result<Self, ZayavkaError> {
        let db = Database::open(path).await?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Wrap an already-open database.
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Fetch a profile by internal id (used when resolving assignees).
    pub async fn fetch_profile_by_id(
        &self,
        id: ProfileId,
    ) -> Result<Option<Profile>, ZayavkaError> {
        queries::profiles::fetch_by_id(&self.db, id).await
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn exists(&self, chat_id: ChatId) -> Result<bool, ZayavkaError> {
        queries::profiles::exists(&self.db, chat_id).await
    }

    async fn fetch(&self, chat_id: ChatId) -> Result<Option<Profile>, ZayavkaError> {
        queries::profiles::fetch(&self.db, chat_id).await
    }

    async fn upsert(
        &self,
        chat_id: ChatId,
        username: Option<String>,
        draft: &ProfileDraft,
    ) -> Result<Profile, ZayavkaError> {
        queries::profiles::upsert(&self.db, chat_id, username, draft).await
    }
}

#[async_trait]
impl TicketStore for SqliteStore {
    async fn save_ticket(
        &self,
        requester: ProfileId,
        draft: &TicketDraft,
        assignee: ProfileId,
    ) -> Result<TicketId, ZayavkaError> {
        queries::tickets::save_ticket(&self.db, requester, draft, assignee).await
    }

    async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, ZayavkaError> {
        queries::tickets::fetch_ticket(&self.db, id).await
    }

    async fn set_status_closed(&self, id: TicketId) -> Result<(), ZayavkaError> {
        queries::tickets::set_status_closed(&self.db, id).await
    }

    async fn save_attachment(
        &self,
        parent: AttachmentParent,
        locator: &str,
    ) -> Result<(), ZayavkaError> {
        queries::attachments::save_attachment(&self.db, parent, locator).await
    }

    async fn count_open_by_assignee(&self) -> Result<Vec<(ProfileId, u64)>, ZayavkaError> {
        queries::tickets::count_open_by_assignee(&self.db).await
    }

    async fn pick_assignee(&self) -> Result<Option<(ProfileId, ChatId)>, ZayavkaError> {
        queries::tickets::pick_assignee(&self.db).await
    }

    async fn report_rows(&self, since: Option<&str>) -> Result<Vec<ReportRow>, ZayavkaError> {
        queries::tickets::report_rows(&self.db, since).await
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, chat_id: ChatId) -> Result<SessionState, ZayavkaError> {
        queries::sessions::get_session(&self.db, chat_id).await
    }

    async fn put(&self, chat_id: ChatId, state: SessionState) -> Result<(), ZayavkaError> {
        queries::sessions::put_session(&self.db, chat_id, &state).await
    }
}
