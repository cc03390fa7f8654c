// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Zayavka ticketing bot.

use thiserror::Error;

/// The primary error type used across all Zayavka adapter traits and the
/// protocol engine.
///
/// Collaborator failures (transport, geocoding, email) are converted to
/// user-visible text at the protocol step where they occur and never
/// propagate past a step handler. Integrity violations are rejected at
/// the guard closest to the violation.
#[derive(Debug, Error)]
pub enum ZayavkaError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, file transfer, polling).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reverse geocoding failed or returned an unusable response.
    #[error("geocoding error: {0}")]
    Geocode(String),

    /// Email submission failed.
    #[error("email error: {0}")]
    Email(String),

    /// A unique constraint was violated (duplicate phone number).
    /// User-correctable, not fatal.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A non-staff actor invoked a staff-only action.
    #[error("not authorized")]
    Unauthorized,

    /// Malformed or missing user input at a protocol step.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Staging an uploaded file into the temporary area failed.
    #[error("media staging failed: {0}")]
    Staging(String),

    /// Promoting a staged file into permanent storage failed.
    /// Distinct from [`ZayavkaError::Staging`] so callers can tell a lost
    /// upload from a lost commit.
    #[error("media promotion failed: {0}")]
    Promotion(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ZayavkaError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ZayavkaError::Storage {
            source: Box::new(source),
        }
    }

    /// Build a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        ZayavkaError::Transport {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = ZayavkaError::NotFound {
            entity: "ticket",
            id: 42,
        };
        assert_eq!(err.to_string(), "ticket 42 not found");
    }

    #[test]
    fn staging_and_promotion_are_distinct_messages() {
        let stage = ZayavkaError::Staging("disk full".into());
        let promote = ZayavkaError::Promotion("disk full".into());
        assert_ne!(stage.to_string(), promote.to_string());
    }
}
