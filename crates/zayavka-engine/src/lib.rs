// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protocol engine for the Zayavka ticketing bot.
//!
//! The engine consumes transport-neutral [`InboundEvent`]s, drives the
//! registration, intake, and resolution state machines against the session
//! store, and talks to its collaborators only through the capability traits
//! defined in `zayavka-core`. Slow side effects (staff notification, email)
//! go through the [`fanout`] queue so no protocol step blocks on them.

pub mod balancer;
pub mod fanout;
pub mod media;
pub mod session;

mod intake;
mod registration;
mod resolution;

use std::sync::Arc;

use tracing::{debug, warn};
use zayavka_core::{
    event::labels, ChatId, ChatTransport, Geocoder, InboundEvent, InboundPayload, Keyboard,
    OperatingHours, OutboundMessage, ProfileStore, Role, SessionState, SessionStore, TicketId,
    TicketStore, ZayavkaError,
};

pub use balancer::Balancer;
pub use fanout::{spawn_fanout, FanoutCommand, FanoutHandle};
pub use media::MediaStaging;
pub use session::MemorySessionStore;

/// Everything the engine needs, injected at wiring time.
pub struct EngineDeps {
    pub profiles: Arc<dyn ProfileStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub transport: Arc<dyn ChatTransport>,
    pub geocoder: Arc<dyn Geocoder>,
    pub fanout: FanoutHandle,
    pub hours: OperatingHours,
    pub media: MediaStaging,
}

/// The protocol engine. One instance serves all conversations; per-chat
/// state lives in the session store.
pub struct Engine {
    pub(crate) profiles: Arc<dyn ProfileStore>,
    pub(crate) tickets: Arc<dyn TicketStore>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) geocoder: Arc<dyn Geocoder>,
    pub(crate) fanout: FanoutHandle,
    pub(crate) hours: OperatingHours,
    pub(crate) media: MediaStaging,
    pub(crate) balancer: Balancer,
}

impl Engine {
    pub fn new(deps: EngineDeps) -> Self {
        let balancer = Balancer::new(deps.tickets.clone());
        Self {
            profiles: deps.profiles,
            tickets: deps.tickets,
            sessions: deps.sessions,
            transport: deps.transport,
            geocoder: deps.geocoder,
            fanout: deps.fanout,
            hours: deps.hours,
            media: deps.media,
            balancer,
        }
    }

    /// Handle one inbound event. Errors returned here are infrastructure
    /// failures (storage, transport); protocol-level problems are answered
    /// in-band with a chat message and an `Ok` result.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), ZayavkaError> {
        // Inline buttons carry their own addressing and are valid from any
        // state; the resolution entry guard does its own checks.
        if let InboundPayload::Callback { data } = &event.payload {
            return self.handle_callback(&event, data).await;
        }

        // /start resets the conversation to the menu (or to registration
        // when no profile exists yet), whatever was in flight.
        if matches!(&event.payload, InboundPayload::Text(t) if t.trim() == "/start") {
            return self.handle_start(&event).await;
        }

        match self.sessions.get(event.chat_id).await? {
            SessionState::Idle => self.handle_start(&event).await,
            SessionState::MainMenu(role) => self.handle_menu(&event, role).await,
            SessionState::Registration {
                step,
                draft,
                is_new,
            } => self.registration_step(&event, step, draft, is_new).await,
            SessionState::Intake { step, draft } => self.intake_step(&event, step, draft).await,
            SessionState::Resolution { ticket_id } => {
                self.resolution_reply(&event, ticket_id).await
            }
        }
    }

    async fn handle_start(&self, event: &InboundEvent) -> Result<(), ZayavkaError> {
        match self.profiles.fetch(event.chat_id).await? {
            Some(profile) => {
                self.show_menu(
                    event.chat_id,
                    profile.role,
                    "Главное меню. Выберите действие:",
                )
                .await
            }
            None => self.begin_registration_new(event).await,
        }
    }

    async fn handle_menu(&self, event: &InboundEvent, role: Role) -> Result<(), ZayavkaError> {
        match event.payload.text().map(str::trim) {
            Some(labels::CREATE_TICKET) => self.begin_intake(event).await,
            Some(labels::REFRESH_DATA) => self.begin_registration_refresh(event).await,
            _ => {
                self.say_kb(
                    event.chat_id,
                    "Выберите действие с помощью кнопок меню.",
                    Keyboard::MainMenu(role),
                )
                .await
            }
        }
    }

    async fn handle_callback(
        &self,
        event: &InboundEvent,
        data: &str,
    ) -> Result<(), ZayavkaError> {
        if let Some(id) = data.strip_prefix("answer:").and_then(|s| s.parse::<i64>().ok()) {
            return self.begin_resolution(event, TicketId(id)).await;
        }
        warn!(chat = %event.chat_id, data, "unrecognized callback data ignored");
        Ok(())
    }

    // Shared plumbing for the protocol modules.

    pub(crate) async fn say(
        &self,
        chat_id: ChatId,
        text: impl Into<String>,
    ) -> Result<(), ZayavkaError> {
        self.transport.send(OutboundMessage::text(chat_id, text)).await
    }

    pub(crate) async fn say_kb(
        &self,
        chat_id: ChatId,
        text: impl Into<String>,
        keyboard: Keyboard,
    ) -> Result<(), ZayavkaError> {
        self.transport
            .send(OutboundMessage::with_keyboard(chat_id, text, keyboard))
            .await
    }

    pub(crate) async fn set_state(
        &self,
        chat_id: ChatId,
        state: SessionState,
    ) -> Result<(), ZayavkaError> {
        debug!(chat = %chat_id, ?state, "session transition");
        self.sessions.put(chat_id, state).await
    }

    /// Put the conversation at the main menu and show it.
    pub(crate) async fn show_menu(
        &self,
        chat_id: ChatId,
        role: Role,
        text: &str,
    ) -> Result<(), ZayavkaError> {
        self.set_state(chat_id, SessionState::MainMenu(role)).await?;
        self.say_kb(chat_id, text, Keyboard::MainMenu(role)).await
    }

    /// Menu role for a conversation, re-derived from the profile store.
    /// Falls back to `User` when the profile vanished mid-flow.
    pub(crate) async fn menu_role(&self, chat_id: ChatId) -> Result<Role, ZayavkaError> {
        Ok(self
            .profiles
            .fetch(chat_id)
            .await?
            .map(|p| p.role)
            .unwrap_or(Role::User))
    }
}
