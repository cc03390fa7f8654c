// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff resolution protocol.
//!
//! Entered from the inline "Написать ответ" button on a ticket
//! notification. The already-closed guard runs twice: at entry and again
//! right before the closing write, so a second reply to the same ticket
//! produces zero deliveries. Closure is recorded after the chat delivery
//! has been attempted and the email command queued; a failed chat delivery
//! is reported to the staff member but never reopens the ticket.

use tracing::{info, warn};
use zayavka_core::{
    AttachmentParent, InboundEvent, InboundPayload, Keyboard, MessageBody, OutboundMessage,
    Role, SessionState, StagedMedia, Ticket, TicketId, TicketStatus, ZayavkaError,
};

use crate::fanout::FanoutCommand;
use crate::Engine;

impl Engine {
    pub(crate) async fn begin_resolution(
        &self,
        event: &InboundEvent,
        ticket_id: TicketId,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        let staff = self.profiles.fetch(chat).await?;
        if !staff.is_some_and(|p| p.role == Role::Staff) {
            return self.say(chat, "Эта функция доступна только сотрудникам.").await;
        }

        let Some(ticket) = self.tickets.fetch_ticket(ticket_id).await? else {
            return self.say(chat, format!("Заявка №{ticket_id} не найдена.")).await;
        };
        if ticket.status == TicketStatus::Closed {
            // Guard: no transition, no state change.
            return self.say(chat, format!("Заявка №{ticket_id} уже закрыта.")).await;
        }

        self.set_state(chat, SessionState::Resolution { ticket_id }).await?;
        self.say_kb(
            chat,
            format!("Введите текст ответа по заявке №{ticket_id}:"),
            Keyboard::Remove,
        )
        .await
    }

    pub(crate) async fn resolution_reply(
        &self,
        event: &InboundEvent,
        ticket_id: TicketId,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        let Some(reply_text) = event
            .payload
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return self
                .say(chat, "Ответ не может быть пустым. Введите текст ответа:")
                .await;
        };

        // Stage reply media before touching the ticket; a failed download
        // degrades to a text-only reply.
        let staged = match &event.payload {
            InboundPayload::Media { kind, file_id, .. } => {
                match self.stage_reply_file(file_id).await {
                    Ok(path) => Some(StagedMedia { kind: *kind, path }),
                    Err(e) => {
                        warn!(chat = %chat, error = %e, "reply media staging failed");
                        self.say(chat, "Не удалось загрузить файл. Ответ будет отправлен без вложения.")
                            .await?;
                        None
                    }
                }
            }
            _ => None,
        };

        // Re-check right before committing: a concurrent resolution may
        // have closed the ticket while this reply was being composed.
        let Some(ticket) = self.tickets.fetch_ticket(ticket_id).await? else {
            return self
                .show_menu(
                    chat,
                    Role::Staff,
                    &format!("Заявка №{ticket_id} не найдена. Выберите действие:"),
                )
                .await;
        };
        if ticket.status == TicketStatus::Closed {
            return self
                .show_menu(
                    chat,
                    Role::Staff,
                    &format!("Заявка №{ticket_id} уже закрыта. Выберите действие:"),
                )
                .await;
        }

        let attachment = self.commit_reply_media(ticket_id, staged.as_ref()).await;

        // Best-effort email copy, queued before chat delivery.
        if let Some(email) = &ticket.requester.email {
            self.fanout.enqueue(FanoutCommand::Email {
                to: email.clone(),
                subject: format!("Ответ по заявке №{ticket_id}"),
                body: reply_text.to_string(),
                attachment: attachment.clone(),
            });
        }

        self.deliver_reply(chat, &ticket, reply_text, staged.as_ref(), attachment)
            .await?;

        self.tickets.set_status_closed(ticket_id).await?;
        info!(ticket = %ticket_id, "ticket closed");

        self.show_menu(
            chat,
            Role::Staff,
            &format!("Заявка №{ticket_id} закрыта. Выберите действие:"),
        )
        .await
    }

    async fn stage_reply_file(&self, file_id: &str) -> Result<std::path::PathBuf, ZayavkaError> {
        tokio::fs::create_dir_all(self.media.staging_dir())
            .await
            .map_err(|e| ZayavkaError::Staging(e.to_string()))?;
        self.transport.stage_file(file_id, self.media.staging_dir()).await
    }

    /// Promote staged reply media and record the attachment row. Both are
    /// best-effort; the reply is delivered without media on failure.
    async fn commit_reply_media(
        &self,
        ticket_id: TicketId,
        staged: Option<&StagedMedia>,
    ) -> Option<std::path::PathBuf> {
        let staged = staged?;
        match self.media.promote_reply(ticket_id, staged).await {
            Ok(dest) => {
                let locator = dest.to_string_lossy().into_owned();
                if let Err(e) = self
                    .tickets
                    .save_attachment(AttachmentParent::Reply(ticket_id), &locator)
                    .await
                {
                    warn!(ticket = %ticket_id, error = %e, "reply attachment row not saved");
                }
                if let Err(e) = self.media.sweep().await {
                    warn!(error = %e, "staging sweep failed");
                }
                Some(dest)
            }
            Err(e) => {
                warn!(ticket = %ticket_id, error = %e, "reply media promotion failed");
                None
            }
        }
    }

    /// Deliver the reply to the requester's chat. Failure is reported to
    /// the staff member; the closure still proceeds.
    async fn deliver_reply(
        &self,
        staff_chat: zayavka_core::ChatId,
        ticket: &Ticket,
        reply_text: &str,
        staged: Option<&StagedMedia>,
        attachment: Option<std::path::PathBuf>,
    ) -> Result<(), ZayavkaError> {
        let caption = format!("<b>Ответ по заявке №{}</b>\n{reply_text}", ticket.id);
        let body = match (staged, attachment) {
            (Some(staged), Some(path)) => match staged.kind {
                zayavka_core::MediaKind::Photo => MessageBody::Photo { path, caption },
                zayavka_core::MediaKind::Video => MessageBody::Video { path, caption },
            },
            _ => MessageBody::Text(caption),
        };
        let msg = OutboundMessage {
            chat_id: ticket.requester.chat_id,
            body,
            keyboard: None,
        };
        if let Err(e) = self.transport.send(msg).await {
            warn!(ticket = %ticket.id, error = %e, "reply delivery to requester failed");
            self.say(staff_chat, "Не удалось доставить ответ в чат заявителя.")
                .await?;
        }
        Ok(())
    }
}
