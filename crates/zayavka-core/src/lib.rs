// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types, capability traits, and protocol state machines for the
//! Zayavka support-ticketing bot.
//!
//! Everything the protocol engine needs to reason about -- profiles,
//! tickets, attachments, session state, operating hours -- lives here,
//! behind adapter traits so that the Telegram transport, SQLite store,
//! geocoder, and mailer stay replaceable at the seams.

pub mod error;
pub mod event;
pub mod hours;
pub mod session;
pub mod traits;
pub mod types;

pub use error::ZayavkaError;
pub use event::{InboundEvent, InboundPayload, Keyboard, MessageBody, OutboundMessage};
pub use hours::{ClosedReason, OperatingHours};
pub use session::{
    IntakeStep, RegistrationStep, SessionState, StagedMedia, TicketDraft,
};
pub use traits::geocode::ADDRESS_NOT_FOUND;
pub use traits::store::ReportRow;
pub use traits::{ChatTransport, Geocoder, Mailer, ProfileStore, SessionStore, TicketStore};
pub use types::{
    Attachment, AttachmentParent, Category, ChatId, MediaKind, Profile, ProfileDraft,
    ProfileId, Role, Ticket, TicketId, TicketStatus,
};
