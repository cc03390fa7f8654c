// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Zayavka crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ZayavkaError;

/// External chat participant id (the Telegram user id).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Internal profile row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub i64);

/// Ticket id, assigned by the repository, monotonically increasing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TicketId(pub i64);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Role of a stored profile. Single-valued at any instant; there are no
/// dual-role accounts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Staff,
}

/// Lifecycle status of a ticket. The only legal transition is
/// open -> closed, driven by a completed resolution flow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

/// Fixed ticket category set. The display strings double as the button
/// labels shown to the user and the values stored in the database.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum Category {
    #[strum(serialize = "Вывоз ТКО")]
    #[serde(rename = "Вывоз ТКО")]
    SolidWaste,
    #[strum(serialize = "Вывоз КГО")]
    #[serde(rename = "Вывоз КГО")]
    BulkyWaste,
    #[strum(serialize = "Вывоз РСО")]
    #[serde(rename = "Вывоз РСО")]
    Recyclables,
    #[strum(serialize = "Начисления")]
    #[serde(rename = "Начисления")]
    Billing,
    #[strum(serialize = "Корректировки данных в квитанции")]
    #[serde(rename = "Корректировки данных в квитанции")]
    InvoiceCorrection,
    #[strum(serialize = "Другое")]
    #[serde(rename = "Другое")]
    Other,
}

/// A stored identity record for either an end user or a staff member.
///
/// Created on first successful registration; mutated by the "refresh my
/// data" flow; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    /// External participant id, unique across the system.
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub full_name: String,
    /// Unique when present; collisions surface as [`ZayavkaError::Conflict`].
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

/// Fields collected by the registration flow, merged by the caller before
/// the upsert (skip semantics are resolved in the protocol, not the store).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Kind of media accepted by the intake and resolution flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
}

/// The parent aggregate an attachment belongs to. Exactly one of ticket or
/// reply -- never both, never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentParent {
    Ticket(TicketId),
    Reply(TicketId),
}

impl AttachmentParent {
    /// Reconstruct a parent from the two nullable storage references,
    /// rejecting rows that violate the exactly-one-parent invariant.
    pub fn from_refs(
        ticket_ref: Option<i64>,
        reply_ref: Option<i64>,
    ) -> Result<Self, ZayavkaError> {
        match (ticket_ref, reply_ref) {
            (Some(id), None) => Ok(AttachmentParent::Ticket(TicketId(id))),
            (None, Some(id)) => Ok(AttachmentParent::Reply(TicketId(id))),
            (Some(_), Some(_)) => Err(ZayavkaError::Internal(
                "attachment references both a ticket and a reply".into(),
            )),
            (None, None) => Err(ZayavkaError::Internal(
                "attachment references neither a ticket nor a reply".into(),
            )),
        }
    }

    /// The two nullable references as stored.
    pub fn as_refs(&self) -> (Option<i64>, Option<i64>) {
        match self {
            AttachmentParent::Ticket(id) => (Some(id.0), None),
            AttachmentParent::Reply(id) => (None, Some(id.0)),
        }
    }
}

/// An immutable stored media file, owned by exactly one ticket or reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub parent: AttachmentParent,
    /// Path to the file in permanent, parent-scoped storage.
    pub locator: String,
    pub created_at: String,
}

/// A support request raised by a user, tracked through open/closed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub requester: Profile,
    /// Set exactly once at creation, never reassigned.
    pub assignee: ProfileId,
    pub category: Category,
    pub address: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub attachments: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::Staff.to_string(), "staff");
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn category_display_matches_button_labels() {
        assert_eq!(Category::SolidWaste.to_string(), "Вывоз ТКО");
        assert_eq!(
            Category::from_str("Корректировки данных в квитанции").unwrap(),
            Category::InvoiceCorrection
        );
        assert!(Category::from_str("Неизвестно").is_err());
    }

    #[test]
    fn attachment_parent_requires_exactly_one_ref() {
        assert_eq!(
            AttachmentParent::from_refs(Some(1), None).unwrap(),
            AttachmentParent::Ticket(TicketId(1))
        );
        assert_eq!(
            AttachmentParent::from_refs(None, Some(2)).unwrap(),
            AttachmentParent::Reply(TicketId(2))
        );
        assert!(AttachmentParent::from_refs(Some(1), Some(2)).is_err());
        assert!(AttachmentParent::from_refs(None, None).is_err());
    }

    #[test]
    fn attachment_parent_refs_round_trip() {
        let parent = AttachmentParent::Reply(TicketId(7));
        let (ticket_ref, reply_ref) = parent.as_refs();
        assert_eq!(
            AttachmentParent::from_refs(ticket_ref, reply_ref).unwrap(),
            parent
        );
    }

    #[test]
    fn status_is_a_closed_two_value_set() {
        assert_eq!(TicketStatus::from_str("open").unwrap(), TicketStatus::Open);
        assert_eq!(
            TicketStatus::from_str("closed").unwrap(),
            TicketStatus::Closed
        );
        assert!(TicketStatus::from_str("reopened").is_err());
    }
}
