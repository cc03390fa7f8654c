// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase media storage: stage into a temporary area, promote into
//! parent-scoped permanent storage only when the owning ticket or reply
//! commits.
//!
//! An abandoned draft therefore never occupies permanent storage; what it
//! leaves behind in the staging area is reclaimed by [`MediaStaging::sweep`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};
use zayavka_core::{StagedMedia, TicketId, ZayavkaError};

/// Staging and permanent directories plus the staging retention policy.
#[derive(Debug, Clone)]
pub struct MediaStaging {
    staging_dir: PathBuf,
    media_root: PathBuf,
    ttl: Duration,
}

impl MediaStaging {
    pub fn new(
        staging_dir: impl Into<PathBuf>,
        media_root: impl Into<PathBuf>,
        ttl: Duration,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            media_root: media_root.into(),
            ttl,
        }
    }

    /// Directory files are staged into before their parent commits.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Permanent directory for a ticket's own media.
    pub fn ticket_dir(&self, id: TicketId) -> PathBuf {
        self.media_root.join("tickets").join(id.0.to_string())
    }

    /// Permanent directory for reply media, distinct from the ticket's
    /// own attachment path.
    pub fn reply_dir(&self, id: TicketId) -> PathBuf {
        self.media_root.join("replies").join(id.0.to_string())
    }

    /// Promote a staged file into the ticket's permanent directory.
    /// Returns the committed locator path.
    pub async fn promote_ticket(
        &self,
        id: TicketId,
        staged: &StagedMedia,
    ) -> Result<PathBuf, ZayavkaError> {
        self.promote(self.ticket_dir(id), staged).await
    }

    /// Promote a staged file into the reply directory for the ticket.
    pub async fn promote_reply(
        &self,
        id: TicketId,
        staged: &StagedMedia,
    ) -> Result<PathBuf, ZayavkaError> {
        self.promote(self.reply_dir(id), staged).await
    }

    async fn promote(&self, dest_dir: PathBuf, staged: &StagedMedia) -> Result<PathBuf, ZayavkaError> {
        if !staged.path.exists() {
            return Err(ZayavkaError::Promotion(format!(
                "staged file {} is missing",
                staged.path.display()
            )));
        }
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| ZayavkaError::Promotion(e.to_string()))?;

        let dest = dest_dir.join(staged.file_name());
        match tokio::fs::rename(&staged.path, &dest).await {
            Ok(()) => {}
            Err(_) => {
                // Rename fails across filesystems; fall back to copy+remove.
                tokio::fs::copy(&staged.path, &dest)
                    .await
                    .map_err(|e| ZayavkaError::Promotion(e.to_string()))?;
                if let Err(e) = tokio::fs::remove_file(&staged.path).await {
                    warn!(path = %staged.path.display(), error = %e, "staged file not removed after copy");
                }
            }
        }
        debug!(dest = %dest.display(), "media promoted");
        Ok(dest)
    }

    /// Remove staged files older than the retention TTL. Returns the
    /// number of files removed. Missing staging directory is not an error.
    pub async fn sweep(&self) -> Result<usize, ZayavkaError> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.staging_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ZayavkaError::Staging(e.to_string())),
        };
        let cutoff = SystemTime::now() - self.ttl;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ZayavkaError::Staging(e.to_string()))?
        {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if modified < cutoff {
                if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                    warn!(path = %entry.path().display(), error = %e, "sweep failed to remove staged file");
                } else {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            debug!(removed, "staging sweep complete");
        }
        Ok(removed)
    }
}
