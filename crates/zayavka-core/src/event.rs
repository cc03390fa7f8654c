// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport-neutral inbound events and outbound messages.
//!
//! The engine never touches the Telegram API directly: the transport
//! adapter maps platform updates into [`InboundEvent`] and renders
//! [`OutboundMessage`] (including the [`Keyboard`] hints) back into
//! platform calls.

use std::path::PathBuf;

use crate::types::{ChatId, MediaKind, Role, TicketId};

/// Button labels shared between the engine (which matches on them) and
/// the transport (which renders them).
pub mod labels {
    pub const CREATE_TICKET: &str = "📝 Создать заявку";
    pub const REFRESH_DATA: &str = "🔄 Обновить свои данные";
    pub const ACCEPT: &str = "Принять";
    pub const YES: &str = "Да";
    pub const NO: &str = "Нет";
    pub const SKIP: &str = "Пропустить";
    pub const LEAVE_EMPTY: &str = "Оставить пустым";
    pub const ROLE_STAFF: &str = "Администратор";
    pub const ROLE_USER: &str = "Пользователь";
    pub const SEND_PHONE: &str = "Отправить номер";
    pub const SEND_LOCATION: &str = "Отправить адрес";
    pub const WRITE_ANSWER: &str = "Написать ответ";
}

/// One inbound chat interaction, classified by payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub payload: InboundPayload,
}

/// What the participant sent.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    Text(String),
    /// Shared contact card (phone number).
    Contact { phone: String },
    /// Shared location pin.
    Location { latitude: f64, longitude: f64 },
    /// A photo or video, referenced by the transport's file id. The
    /// transport has already selected the highest-resolution photo
    /// variant when several were offered.
    Media {
        kind: MediaKind,
        file_id: String,
        caption: Option<String>,
    },
    /// Inline button press carrying opaque callback data.
    Callback { data: String },
}

impl InboundPayload {
    /// Text content of the event, whether body or media caption.
    pub fn text(&self) -> Option<&str> {
        match self {
            InboundPayload::Text(t) => Some(t),
            InboundPayload::Media { caption, .. } => caption.as_deref(),
            _ => None,
        }
    }
}

/// Reply-keyboard hint attached to an outbound message.
///
/// The transport renders these into platform-specific markup; the engine
/// only decides which keyboard a step needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// Remove any visible reply keyboard.
    Remove,
    /// Main menu for the given role.
    MainMenu(Role),
    /// The fixed category buttons.
    Categories,
    /// "Да" / "Нет".
    Confirmation,
    /// "Принять" consent button.
    Consent,
    /// "Администратор" / "Пользователь" role choice.
    RoleChoice,
    /// Location-request button for the address step.
    AddressRequest,
    /// Optional skip/empty/contact-share buttons for registration steps.
    SkipButtons {
        skip: bool,
        empty: bool,
        contact: bool,
    },
    /// Inline "Написать ответ" button bound to a ticket.
    Answer(TicketId),
}

/// Message body to deliver: plain text (with minimal bold markup) or a
/// stored media file with caption.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    Photo { path: PathBuf, caption: String },
    Video { path: PathBuf, caption: String },
}

/// One outbound message the engine wants delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub body: MessageBody,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    /// Plain text message without keyboard changes.
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            body: MessageBody::Text(text.into()),
            keyboard: None,
        }
    }

    /// Text message with a keyboard hint.
    pub fn with_keyboard(chat_id: ChatId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            chat_id,
            body: MessageBody::Text(text.into()),
            keyboard: Some(keyboard),
        }
    }
}
