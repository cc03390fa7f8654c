// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport capability.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ZayavkaError;
use crate::event::OutboundMessage;

/// Outbound side of the chat transport.
///
/// The engine treats delivery as a capability: "send message/photo/video
/// to recipient X", "stage the file behind this transport file id". The
/// inbound event stream is owned by the adapter's polling task and is not
/// part of this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one message. Markup rendering (bold, keyboards) is the
    /// adapter's concern.
    async fn send(&self, msg: OutboundMessage) -> Result<(), ZayavkaError>;

    /// Download the file behind `file_id` into the staging directory,
    /// returning the staged path. The adapter resolves the file's
    /// extension and applies its download timeout.
    async fn stage_file(
        &self,
        file_id: &str,
        staging_dir: &Path,
    ) -> Result<PathBuf, ZayavkaError>;
}
