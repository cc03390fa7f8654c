// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket intake protocol.
//!
//! category -> address -> address confirmation -> optional media ->
//! description -> final confirmation. Entry is gated by operating hours.
//! Media is staged into the temporary area during the flow and promoted
//! into permanent ticket storage only when the user confirms; an aborted
//! draft leaves the staged file for the TTL sweep.

use std::str::FromStr;

use tracing::{info, warn};
use zayavka_core::{
    event::labels, hours::local_now, AttachmentParent, Category, ClosedReason, InboundEvent,
    InboundPayload, IntakeStep, Keyboard, Profile, SessionState, StagedMedia, TicketDraft,
    ADDRESS_NOT_FOUND, ZayavkaError,
};

use crate::fanout::FanoutCommand;
use crate::Engine;

const CATEGORY_PROMPT: &str = "Выберите категорию заявки:";
const ADDRESS_PROMPT: &str =
    "Введите адрес вручную или отправьте геолокацию кнопкой ниже:";
const MEDIA_PROMPT: &str =
    "Прикрепите фото или видео проблемы или нажмите «Пропустить».";
const DESCRIPTION_PROMPT: &str = "Опишите проблему:";

impl Engine {
    pub(crate) async fn begin_intake(&self, event: &InboundEvent) -> Result<(), ZayavkaError> {
        if let Err(reason) = self.hours.check(local_now()) {
            let message = match reason {
                ClosedReason::OffDay => "Сегодня нерабочий день. Заявки принимаются в рабочие дни.",
                ClosedReason::OffHours => {
                    "Сейчас нерабочее время. Заявки принимаются в рабочие часы."
                }
            };
            return self.say(event.chat_id, message).await;
        }

        self.set_state(
            event.chat_id,
            SessionState::Intake {
                step: IntakeStep::SelectCategory,
                draft: TicketDraft::default(),
            },
        )
        .await?;
        self.say_kb(event.chat_id, CATEGORY_PROMPT, Keyboard::Categories).await
    }

    pub(crate) async fn intake_step(
        &self,
        event: &InboundEvent,
        step: IntakeStep,
        mut draft: TicketDraft,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        let text = event.payload.text().map(str::trim);

        match step {
            IntakeStep::SelectCategory => {
                let Some(category) = text.and_then(|t| Category::from_str(t).ok()) else {
                    return self
                        .say_kb(chat, "Выберите категорию с помощью кнопок.", Keyboard::Categories)
                        .await;
                };
                draft.category = Some(category);
                self.set_state(
                    chat,
                    SessionState::Intake {
                        step: IntakeStep::EnterAddress,
                        draft,
                    },
                )
                .await?;
                self.say_kb(chat, ADDRESS_PROMPT, Keyboard::AddressRequest).await
            }

            IntakeStep::EnterAddress => {
                let address = match &event.payload {
                    InboundPayload::Location {
                        latitude,
                        longitude,
                    } => self.resolve_address(*latitude, *longitude).await,
                    _ => match text.filter(|t| !t.is_empty()) {
                        Some(t) => t.to_string(),
                        None => {
                            return self
                                .say_kb(chat, ADDRESS_PROMPT, Keyboard::AddressRequest)
                                .await;
                        }
                    },
                };
                let prompt = format!("Адрес: <b>{address}</b>\nВсё верно?");
                draft.address = Some(address);
                self.set_state(
                    chat,
                    SessionState::Intake {
                        step: IntakeStep::ConfirmAddress,
                        draft,
                    },
                )
                .await?;
                self.say_kb(chat, prompt, Keyboard::Confirmation).await
            }

            IntakeStep::ConfirmAddress => match text {
                Some(labels::YES) => {
                    self.set_state(
                        chat,
                        SessionState::Intake {
                            step: IntakeStep::AttachMedia,
                            draft,
                        },
                    )
                    .await?;
                    self.say_kb(
                        chat,
                        MEDIA_PROMPT,
                        Keyboard::SkipButtons {
                            skip: true,
                            empty: false,
                            contact: false,
                        },
                    )
                    .await
                }
                Some(labels::NO) => {
                    draft.address = None;
                    self.set_state(
                        chat,
                        SessionState::Intake {
                            step: IntakeStep::EnterAddress,
                            draft,
                        },
                    )
                    .await?;
                    self.say_kb(chat, ADDRESS_PROMPT, Keyboard::AddressRequest).await
                }
                _ => {
                    self.say_kb(chat, "Ответьте «Да» или «Нет».", Keyboard::Confirmation)
                        .await
                }
            },

            IntakeStep::AttachMedia => match &event.payload {
                InboundPayload::Media { kind, file_id, .. } => {
                    match self.stage_inbound_file(file_id).await {
                        Ok(path) => {
                            draft.media = Some(StagedMedia { kind: *kind, path });
                        }
                        Err(e) => {
                            // Download failure is reported but never blocks
                            // the intake.
                            warn!(chat = %chat, error = %e, "media staging failed");
                            self.say(chat, "Не удалось загрузить файл. Продолжим без вложения.")
                                .await?;
                        }
                    }
                    self.prompt_description(chat, draft).await
                }
                _ if text == Some(labels::SKIP) => self.prompt_description(chat, draft).await,
                _ => {
                    self.say_kb(
                        chat,
                        MEDIA_PROMPT,
                        Keyboard::SkipButtons {
                            skip: true,
                            empty: false,
                            contact: false,
                        },
                    )
                    .await
                }
            },

            IntakeStep::EnterDescription => {
                let Some(description) = text.filter(|t| !t.is_empty()) else {
                    return self.say(chat, DESCRIPTION_PROMPT).await;
                };
                draft.description = Some(description.to_string());
                let summary = draft_summary(&draft);
                self.set_state(
                    chat,
                    SessionState::Intake {
                        step: IntakeStep::ConfirmTicket,
                        draft,
                    },
                )
                .await?;
                self.say_kb(
                    chat,
                    format!("{summary}\n\nОтправить заявку?"),
                    Keyboard::Confirmation,
                )
                .await
            }

            IntakeStep::ConfirmTicket => match text {
                Some(labels::YES) => self.finalize_ticket(event, draft).await,
                Some(labels::NO) => {
                    // Draft discarded; a staged file stays in the
                    // temporary area for the sweep.
                    let role = self.menu_role(chat).await?;
                    self.show_menu(chat, role, "Заявка отменена. Выберите действие:").await
                }
                _ => {
                    self.say_kb(chat, "Ответьте «Да» или «Нет».", Keyboard::Confirmation)
                        .await
                }
            },
        }
    }

    async fn resolve_address(&self, latitude: f64, longitude: f64) -> String {
        match self.geocoder.reverse(latitude, longitude).await {
            Ok(Some(address)) => address,
            Ok(None) => ADDRESS_NOT_FOUND.to_string(),
            Err(e) => {
                warn!(latitude, longitude, error = %e, "reverse geocoding failed");
                ADDRESS_NOT_FOUND.to_string()
            }
        }
    }

    async fn stage_inbound_file(&self, file_id: &str) -> Result<std::path::PathBuf, ZayavkaError> {
        tokio::fs::create_dir_all(self.media.staging_dir())
            .await
            .map_err(|e| ZayavkaError::Staging(e.to_string()))?;
        self.transport.stage_file(file_id, self.media.staging_dir()).await
    }

    async fn prompt_description(
        &self,
        chat: zayavka_core::ChatId,
        draft: TicketDraft,
    ) -> Result<(), ZayavkaError> {
        self.set_state(
            chat,
            SessionState::Intake {
                step: IntakeStep::EnterDescription,
                draft,
            },
        )
        .await?;
        self.say_kb(chat, DESCRIPTION_PROMPT, Keyboard::Remove).await
    }

    /// Confirmed draft: pick an assignee, persist, promote media, queue
    /// the staff notification, and return the requester to the menu.
    async fn finalize_ticket(
        &self,
        event: &InboundEvent,
        draft: TicketDraft,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        let Some(profile) = self.profiles.fetch(chat).await? else {
            // Profile lost mid-flow; restart from scratch.
            return self.handle_start_fallback(event).await;
        };

        let Some((assignee, staff_chat)) = self.balancer.pick().await? else {
            // Never create an unassigned ticket.
            let role = profile.role;
            self.say(chat, "Сейчас нет доступных сотрудников. Попробуйте позже.").await?;
            return self.show_menu(chat, role, "Выберите действие:").await;
        };

        let ticket_id = self.tickets.save_ticket(profile.id, &draft, assignee).await?;
        info!(ticket = %ticket_id, assignee = assignee.0, "ticket created");

        // Promotion and the attachment row are best-effort: the ticket
        // exists either way.
        let mut notice_media = None;
        if let Some(staged) = &draft.media {
            match self.media.promote_ticket(ticket_id, staged).await {
                Ok(dest) => {
                    let locator = dest.to_string_lossy().into_owned();
                    match self
                        .tickets
                        .save_attachment(AttachmentParent::Ticket(ticket_id), &locator)
                        .await
                    {
                        Ok(()) => notice_media = Some((staged.kind, dest)),
                        Err(e) => {
                            warn!(ticket = %ticket_id, error = %e, "attachment row not saved")
                        }
                    }
                }
                Err(e) => warn!(ticket = %ticket_id, error = %e, "media promotion failed"),
            }
            if let Err(e) = self.media.sweep().await {
                warn!(error = %e, "staging sweep failed");
            }
        }

        self.fanout.enqueue(FanoutCommand::StaffNotice {
            chat_id: staff_chat,
            ticket_id,
            summary: ticket_notice(ticket_id, &draft, &profile),
            media: notice_media,
        });

        self.show_menu(
            chat,
            profile.role,
            &format!("Заявка №{ticket_id} создана. Мы свяжемся с вами после её рассмотрения."),
        )
        .await
    }

    async fn handle_start_fallback(&self, event: &InboundEvent) -> Result<(), ZayavkaError> {
        self.set_state(event.chat_id, SessionState::Idle).await?;
        self.begin_registration_new(event).await
    }
}

fn draft_summary(draft: &TicketDraft) -> String {
    let category = draft.category.map(|c| c.to_string()).unwrap_or_default();
    let address = draft.address.as_deref().unwrap_or_default();
    let description = draft.description.as_deref().unwrap_or_default();
    let media = if draft.media.is_some() {
        "есть"
    } else {
        "нет"
    };
    format!(
        "<b>Ваша заявка</b>\nКатегория: {category}\nАдрес: {address}\nОписание: {description}\nВложение: {media}"
    )
}

fn ticket_notice(
    ticket_id: zayavka_core::TicketId,
    draft: &TicketDraft,
    requester: &Profile,
) -> String {
    let category = draft.category.map(|c| c.to_string()).unwrap_or_default();
    let address = draft.address.as_deref().unwrap_or_default();
    let description = draft.description.as_deref().unwrap_or_default();
    let mut notice = format!(
        "<b>Новая заявка №{ticket_id}</b>\nКатегория: {category}\nАдрес: {address}\nОписание: {description}\nЗаявитель: {}",
        requester.full_name
    );
    if let Some(phone) = &requester.phone {
        notice.push_str(&format!(", тел. {phone}"));
    }
    notice
}

#[cfg(test)]
mod tests {
    use zayavka_core::{Category, ChatId, ProfileId, Role};

    use super::*;

    fn sample_draft() -> TicketDraft {
        TicketDraft {
            category: Some(Category::BulkyWaste),
            address: Some("ул. Ленина, 1".into()),
            media: None,
            description: Some("Не вывезен мусор".into()),
        }
    }

    #[test]
    fn summary_lists_all_confirmed_fields() {
        let summary = draft_summary(&sample_draft());
        assert!(summary.contains("Вывоз КГО"));
        assert!(summary.contains("ул. Ленина, 1"));
        assert!(summary.contains("Не вывезен мусор"));
        assert!(summary.contains("Вложение: нет"));
    }

    #[test]
    fn staff_notice_includes_requester_contact() {
        let requester = Profile {
            id: ProfileId(1),
            chat_id: ChatId(100),
            username: None,
            full_name: "Иванов Иван".into(),
            phone: Some("+79123456789".into()),
            email: None,
            role: Role::User,
        };
        let notice = ticket_notice(zayavka_core::TicketId(5), &sample_draft(), &requester);
        assert!(notice.contains("№5"));
        assert!(notice.contains("Иванов Иван"));
        assert!(notice.contains("тел. +79123456789"));
    }
}
