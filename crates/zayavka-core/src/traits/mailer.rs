// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email notification capability.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ZayavkaError;

/// Sends plain-text mail with an optional single binary attachment over an
/// authenticated encrypted submission channel.
///
/// Best-effort from the engine's perspective: failures are logged by the
/// fan-out worker and never block chat delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<(), ZayavkaError>;
}
