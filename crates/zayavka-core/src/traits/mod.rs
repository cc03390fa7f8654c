// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the system's seams.
//!
//! The protocol engine depends only on these traits; the Telegram,
//! SQLite, Nominatim, and SMTP crates provide the implementations.

pub mod geocode;
pub mod mailer;
pub mod store;
pub mod transport;

pub use geocode::Geocoder;
pub use mailer::Mailer;
pub use store::{ProfileStore, SessionStore, TicketStore};
pub use transport::ChatTransport;
