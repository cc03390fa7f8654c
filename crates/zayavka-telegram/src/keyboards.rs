// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of engine keyboard hints into Telegram reply markup.
//!
//! The engine decides WHICH keyboard a step needs; this module decides how
//! it looks. Button labels come from `zayavka_core::event::labels` so the
//! engine can match on the exact strings it asked to be displayed.

use strum::IntoEnumIterator;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ReplyMarkup,
};
use zayavka_core::{event::labels, Category, Keyboard, Role};

/// Render a keyboard hint into Telegram reply markup.
pub fn render(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),

        Keyboard::MainMenu(role) => {
            let rows = match role {
                Role::User => vec![
                    vec![KeyboardButton::new(labels::CREATE_TICKET)],
                    vec![KeyboardButton::new(labels::REFRESH_DATA)],
                ],
                // Staff answer tickets through the inline button on each
                // notification; their menu only refreshes profile data.
                Role::Staff => vec![vec![KeyboardButton::new(labels::REFRESH_DATA)]],
            };
            reply_keyboard(rows)
        }

        Keyboard::Categories => {
            let rows = Category::iter()
                .map(|c| vec![KeyboardButton::new(c.to_string())])
                .collect();
            reply_keyboard(rows)
        }

        Keyboard::Confirmation => reply_keyboard(vec![vec![
            KeyboardButton::new(labels::YES),
            KeyboardButton::new(labels::NO),
        ]]),

        Keyboard::Consent => reply_keyboard(vec![vec![KeyboardButton::new(labels::ACCEPT)]]),

        Keyboard::RoleChoice => reply_keyboard(vec![vec![
            KeyboardButton::new(labels::ROLE_STAFF),
            KeyboardButton::new(labels::ROLE_USER),
        ]]),

        Keyboard::AddressRequest => reply_keyboard(vec![vec![
            KeyboardButton::new(labels::SEND_LOCATION).request(ButtonRequest::Location),
        ]]),

        Keyboard::SkipButtons {
            skip,
            empty,
            contact,
        } => {
            let mut rows = Vec::new();
            if *contact {
                rows.push(vec![
                    KeyboardButton::new(labels::SEND_PHONE).request(ButtonRequest::Contact),
                ]);
            }
            if *skip {
                rows.push(vec![KeyboardButton::new(labels::SKIP)]);
            }
            if *empty {
                rows.push(vec![KeyboardButton::new(labels::LEAVE_EMPTY)]);
            }
            reply_keyboard(rows)
        }

        Keyboard::Answer(ticket_id) => {
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback(
                    labels::WRITE_ANSWER,
                    format!("answer:{ticket_id}"),
                ),
            ]]))
        }
    }
}

fn reply_keyboard(rows: Vec<Vec<KeyboardButton>>) -> ReplyMarkup {
    ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard())
}

#[cfg(test)]
mod tests {
    use zayavka_core::TicketId;

    use super::*;

    fn rows(markup: &ReplyMarkup) -> &Vec<Vec<KeyboardButton>> {
        match markup {
            ReplyMarkup::Keyboard(kb) => &kb.keyboard,
            other => panic!("expected reply keyboard, got {other:?}"),
        }
    }

    #[test]
    fn user_menu_offers_ticket_creation_staff_menu_does_not() {
        let user = render(&Keyboard::MainMenu(Role::User));
        assert_eq!(rows(&user).len(), 2);
        assert_eq!(rows(&user)[0][0].text, labels::CREATE_TICKET);

        let staff = render(&Keyboard::MainMenu(Role::Staff));
        assert_eq!(rows(&staff).len(), 1);
        assert_eq!(rows(&staff)[0][0].text, labels::REFRESH_DATA);
    }

    #[test]
    fn categories_render_one_button_per_variant() {
        let markup = render(&Keyboard::Categories);
        let labels: Vec<_> = rows(&markup).iter().map(|r| r[0].text.clone()).collect();
        assert_eq!(labels.len(), 6);
        assert!(labels.contains(&"Вывоз ТКО".to_string()));
        assert!(labels.contains(&"Другое".to_string()));
    }

    #[test]
    fn answer_button_carries_the_ticket_id_in_callback_data() {
        let markup = render(&Keyboard::Answer(TicketId(42)));
        let ReplyMarkup::InlineKeyboard(inline) = markup else {
            panic!("expected inline keyboard");
        };
        let button = &inline.inline_keyboard[0][0];
        assert_eq!(button.text, labels::WRITE_ANSWER);
        assert_eq!(
            button.kind,
            teloxide::types::InlineKeyboardButtonKind::CallbackData("answer:42".to_string())
        );
    }

    #[test]
    fn contact_and_location_buttons_request_native_sharing() {
        let markup = render(&Keyboard::AddressRequest);
        assert_eq!(
            rows(&markup)[0][0].request,
            Some(ButtonRequest::Location)
        );

        let markup = render(&Keyboard::SkipButtons {
            skip: true,
            empty: false,
            contact: true,
        });
        assert_eq!(rows(&markup)[0][0].request, Some(ButtonRequest::Contact));
        assert_eq!(rows(&markup)[1][0].text, labels::SKIP);
    }
}
