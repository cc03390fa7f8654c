// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reverse geocoding capability.

use async_trait::async_trait;

use crate::error::ZayavkaError;

/// Sentinel stored when coordinates could not be resolved. Geocoding
/// failure never blocks ticket creation.
pub const ADDRESS_NOT_FOUND: &str = "Адрес не найден";

/// Resolves coordinates to a human-readable address.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Reverse-geocode a coordinate pair. `Ok(None)` means the resolver
    /// answered but found nothing; errors and timeouts are the
    /// implementation's to surface. Callers degrade both cases to
    /// [`ADDRESS_NOT_FOUND`].
    async fn reverse(&self, latitude: f64, longitude: f64)
        -> Result<Option<String>, ZayavkaError>;
}
