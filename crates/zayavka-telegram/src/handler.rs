// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of Telegram updates into transport-neutral inbound events.
//!
//! Only private chats are processed; group and channel traffic is ignored.
//! Photo messages select the highest-resolution variant before the file id
//! crosses into the engine.

use teloxide::types::{CallbackQuery, ChatKind, Message};
use tracing::debug;
use zayavka_core::{ChatId, InboundEvent, InboundPayload, MediaKind};

/// True for private (DM) chats; everything else is ignored.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Map a Telegram message into an [`InboundEvent`]. Returns `None` for
/// message types the bot does not handle (stickers, voice, documents).
pub fn map_message(msg: &Message) -> Option<InboundEvent> {
    let username = msg.from.as_ref().and_then(|u| u.username.clone());
    let chat_id = ChatId(msg.chat.id.0);

    let payload = if let Some(text) = msg.text() {
        InboundPayload::Text(text.to_string())
    } else if let Some(contact) = msg.contact() {
        InboundPayload::Contact {
            phone: contact.phone_number.clone(),
        }
    } else if let Some(location) = msg.location() {
        InboundPayload::Location {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    } else if let Some(photos) = msg.photo() {
        // Telegram lists photo variants smallest first.
        let largest = photos.last()?;
        InboundPayload::Media {
            kind: MediaKind::Photo,
            file_id: largest.file.id.to_string(),
            caption: msg.caption().map(str::to_string),
        }
    } else if let Some(video) = msg.video() {
        InboundPayload::Media {
            kind: MediaKind::Video,
            file_id: video.file.id.to_string(),
            caption: msg.caption().map(str::to_string),
        }
    } else {
        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
        return None;
    };

    Some(InboundEvent {
        chat_id,
        username,
        payload,
    })
}

/// Map an inline button press into an [`InboundEvent`]. The originating
/// user id doubles as the private chat id.
pub fn map_callback(query: &CallbackQuery) -> Option<InboundEvent> {
    let data = query.data.clone()?;
    Some(InboundEvent {
        chat_id: ChatId(query.from.id.0 as i64),
        username: query.from.username.clone(),
        payload: InboundPayload::Callback { data },
    })
}
