// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration and "refresh my data" protocol.
//!
//! First contact: consent, full name, phone (shared contact or text),
//! email, then the profile upsert. A refresh skips consent and offers
//! "Пропустить" to keep the stored value; existing staff additionally get
//! a role step and may demote themselves to a regular user.

use tracing::info;
use zayavka_core::{
    event::labels, InboundEvent, InboundPayload, Keyboard, ProfileDraft, RegistrationStep, Role,
    SessionState, ZayavkaError,
};

use crate::Engine;

const CONSENT_PROMPT: &str = "Для работы с ботом необходимо согласие на обработку \
персональных данных. Нажмите «Принять», чтобы продолжить.";
const NAME_PROMPT: &str = "Введите ваше ФИО:";
const PHONE_PROMPT: &str =
    "Отправьте номер телефона кнопкой ниже или введите его вручную:";
const EMAIL_PROMPT: &str = "Введите ваш email:";

impl Engine {
    pub(crate) async fn begin_registration_new(
        &self,
        event: &InboundEvent,
    ) -> Result<(), ZayavkaError> {
        self.set_state(
            event.chat_id,
            SessionState::Registration {
                step: RegistrationStep::Consent,
                draft: ProfileDraft::default(),
                is_new: true,
            },
        )
        .await?;
        self.say_kb(event.chat_id, CONSENT_PROMPT, Keyboard::Consent).await
    }

    pub(crate) async fn begin_registration_refresh(
        &self,
        event: &InboundEvent,
    ) -> Result<(), ZayavkaError> {
        // Consent was already given on first contact.
        self.set_state(
            event.chat_id,
            SessionState::Registration {
                step: RegistrationStep::FullName,
                draft: ProfileDraft::default(),
                is_new: false,
            },
        )
        .await?;
        self.say_kb(event.chat_id, NAME_PROMPT, Keyboard::Remove).await
    }

    pub(crate) async fn registration_step(
        &self,
        event: &InboundEvent,
        step: RegistrationStep,
        mut draft: ProfileDraft,
        is_new: bool,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        let text = event.payload.text().map(str::trim);

        match step {
            RegistrationStep::Consent => {
                if text == Some(labels::ACCEPT) {
                    self.set_state(
                        chat,
                        SessionState::Registration {
                            step: RegistrationStep::FullName,
                            draft,
                            is_new,
                        },
                    )
                    .await?;
                    self.say_kb(chat, NAME_PROMPT, Keyboard::Remove).await
                } else {
                    self.say_kb(chat, CONSENT_PROMPT, Keyboard::Consent).await
                }
            }

            RegistrationStep::FullName => {
                let Some(name) = text.filter(|t| !t.is_empty()) else {
                    return self.say(chat, NAME_PROMPT).await;
                };
                draft.full_name = Some(name.to_string());

                // Only existing staff get to choose a role; everyone else
                // is a regular user.
                let existing_staff = !is_new
                    && self
                        .profiles
                        .fetch(chat)
                        .await?
                        .is_some_and(|p| p.role == Role::Staff);
                if existing_staff {
                    self.set_state(
                        chat,
                        SessionState::Registration {
                            step: RegistrationStep::RoleChoice,
                            draft,
                            is_new,
                        },
                    )
                    .await?;
                    self.say_kb(chat, "Выберите вашу роль:", Keyboard::RoleChoice).await
                } else {
                    draft.role = Some(Role::User);
                    self.prompt_phone(chat, draft, is_new).await
                }
            }

            RegistrationStep::RoleChoice => match text {
                Some(labels::ROLE_STAFF) => {
                    draft.role = Some(Role::Staff);
                    self.prompt_phone(chat, draft, is_new).await
                }
                Some(labels::ROLE_USER) => {
                    draft.role = Some(Role::User);
                    self.prompt_phone(chat, draft, is_new).await
                }
                _ => {
                    self.say_kb(chat, "Выберите вашу роль:", Keyboard::RoleChoice).await
                }
            },

            RegistrationStep::Phone => {
                match &event.payload {
                    InboundPayload::Contact { phone } => {
                        draft.phone = Some(phone.clone());
                    }
                    _ if text == Some(labels::SKIP) && !is_new => {
                        draft.phone = self
                            .profiles
                            .fetch(chat)
                            .await?
                            .and_then(|p| p.phone);
                    }
                    _ => match text.and_then(normalize_phone) {
                        Some(phone) => draft.phone = Some(phone),
                        None => {
                            return self.say(chat, "Введите корректный номер телефона.").await;
                        }
                    },
                }
                self.prompt_email(chat, draft, is_new).await
            }

            RegistrationStep::Email => {
                match text {
                    Some(labels::LEAVE_EMPTY) => draft.email = None,
                    Some(labels::SKIP) if !is_new => {
                        draft.email = self
                            .profiles
                            .fetch(chat)
                            .await?
                            .and_then(|p| p.email);
                    }
                    Some(t) if t.contains('@') && t.contains('.') => {
                        draft.email = Some(t.to_string());
                    }
                    _ => return self.say(chat, "Введите корректный email.").await,
                }
                self.finish_registration(event, draft, is_new).await
            }
        }
    }

    async fn prompt_phone(
        &self,
        chat: zayavka_core::ChatId,
        draft: ProfileDraft,
        is_new: bool,
    ) -> Result<(), ZayavkaError> {
        self.set_state(
            chat,
            SessionState::Registration {
                step: RegistrationStep::Phone,
                draft,
                is_new,
            },
        )
        .await?;
        self.say_kb(
            chat,
            PHONE_PROMPT,
            Keyboard::SkipButtons {
                skip: !is_new,
                empty: false,
                contact: true,
            },
        )
        .await
    }

    async fn prompt_email(
        &self,
        chat: zayavka_core::ChatId,
        draft: ProfileDraft,
        is_new: bool,
    ) -> Result<(), ZayavkaError> {
        self.set_state(
            chat,
            SessionState::Registration {
                step: RegistrationStep::Email,
                draft,
                is_new,
            },
        )
        .await?;
        self.say_kb(
            chat,
            EMAIL_PROMPT,
            Keyboard::SkipButtons {
                skip: !is_new,
                empty: true,
                contact: false,
            },
        )
        .await
    }

    async fn finish_registration(
        &self,
        event: &InboundEvent,
        mut draft: ProfileDraft,
        is_new: bool,
    ) -> Result<(), ZayavkaError> {
        let chat = event.chat_id;
        if draft.role.is_none() {
            // Refresh by a regular user: the role step was skipped.
            draft.role = Some(self.menu_role(chat).await?);
        }

        match self.profiles.upsert(chat, event.username.clone(), &draft).await {
            Ok(profile) => {
                info!(chat = %chat, profile = profile.id.0, is_new, "profile saved");
                self.show_menu(chat, profile.role, "Данные сохранены. Выберите действие:")
                    .await
            }
            Err(ZayavkaError::Conflict(message)) => {
                // User-correctable: back to the phone step with the
                // conflicting number dropped.
                draft.phone = None;
                self.say(chat, message).await?;
                self.prompt_phone(chat, draft, is_new).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Light phone sanity check: keeps the text as entered but requires at
/// least six digits so button labels and stray words are rejected.
fn normalize_phone(text: &str) -> Option<String> {
    let digits = text.chars().filter(char::is_ascii_digit).count();
    let plausible = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    (digits >= 6 && plausible).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization_accepts_common_forms() {
        assert!(normalize_phone("+7 (912) 345-67-89").is_some());
        assert!(normalize_phone("89123456789").is_some());
    }

    #[test]
    fn phone_normalization_rejects_labels_and_short_input() {
        assert_eq!(normalize_phone("Пропустить"), None);
        assert_eq!(normalize_phone("123"), None);
        assert_eq!(normalize_phone("позвоните мне"), None);
    }
}
