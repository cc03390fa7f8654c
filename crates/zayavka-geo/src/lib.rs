// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nominatim reverse geocoding adapter.
//!
//! Turns a shared location pin into a human-readable address line via the
//! `/reverse` endpoint. Failures and timeouts surface as
//! [`ZayavkaError::Geocode`]; the intake protocol degrades them to the
//! "Адрес не найден" sentinel rather than blocking ticket creation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use zayavka_core::{Geocoder, ZayavkaError};

const USER_AGENT: &str = concat!("zayavka-bot/", env!("CARGO_PKG_VERSION"));

/// Reverse geocoder backed by a Nominatim-compatible endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

impl NominatimGeocoder {
    /// Build a geocoder against `endpoint` (base URL without `/reverse`)
    /// with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ZayavkaError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ZayavkaError::Geocode(format!("failed to build http client: {e}")))?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, ZayavkaError> {
        let url = format!("{}/reverse", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2"),
                ("lat", &latitude.to_string()),
                ("lon", &longitude.to_string()),
                ("accept-language", "ru"),
            ])
            .send()
            .await
            .map_err(|e| ZayavkaError::Geocode(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZayavkaError::Geocode(format!(
                "reverse geocoding returned {status}"
            )));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| ZayavkaError::Geocode(format!("malformed reverse geocoding response: {e}")))?;
        debug!(latitude, longitude, found = body.display_name.is_some(), "reverse geocoded");
        Ok(body.display_name)
    }
}
