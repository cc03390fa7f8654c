// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation session state.
//!
//! Each protocol (registration, intake, resolution) is an explicit step
//! enumeration; the session holds the current step plus the draft fields
//! accumulated so far. Illegal transitions are unrepresentable -- the
//! engine dispatches with exhaustive matches over these enums rather than
//! string labels.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{Category, MediaKind, ProfileDraft, Role, TicketId};

/// Steps of the registration / "refresh my data" flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStep {
    /// Consent to personal data processing (first contact only).
    Consent,
    FullName,
    /// Role choice, offered only to existing staff.
    RoleChoice,
    Phone,
    Email,
}

/// Steps of the ticket intake flow, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeStep {
    SelectCategory,
    EnterAddress,
    ConfirmAddress,
    AttachMedia,
    EnterDescription,
    ConfirmTicket,
}

/// A media file staged in the temporary area, not yet promoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedMedia {
    pub kind: MediaKind,
    /// Full path of the staged file inside the staging directory.
    pub path: PathBuf,
}

impl StagedMedia {
    /// File name component of the staged path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ticket fields accumulated across intake steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub category: Option<Category>,
    pub address: Option<String>,
    pub media: Option<StagedMedia>,
    pub description: Option<String>,
}

/// The tagged union of per-conversation protocol state.
///
/// `Idle` doubles as the post-reset state: returning to a menu step is the
/// only way a session is "destroyed". Handlers must tolerate session loss
/// by re-deriving the menu from the profile store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// No protocol in progress and no menu shown yet.
    #[default]
    Idle,
    /// At the main menu for the given role.
    MainMenu(Role),
    Registration {
        step: RegistrationStep,
        draft: ProfileDraft,
        /// Whether this is a first-time registration (affects prompts and
        /// which skip buttons are offered).
        is_new: bool,
    },
    Intake {
        step: IntakeStep,
        draft: TicketDraft,
    },
    /// Staff is composing a reply to the given ticket.
    Resolution {
        ticket_id: TicketId,
    },
}

impl SessionState {
    /// True when the session is at a menu (no multi-step flow in flight).
    pub fn at_menu(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::MainMenu(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert!(SessionState::Idle.at_menu());
        assert!(SessionState::MainMenu(Role::User).at_menu());
    }

    #[test]
    fn in_flight_protocols_are_not_menus() {
        let intake = SessionState::Intake {
            step: IntakeStep::SelectCategory,
            draft: TicketDraft::default(),
        };
        assert!(!intake.at_menu());
        assert!(!SessionState::Resolution {
            ticket_id: TicketId(1)
        }
        .at_menu());
    }

    #[test]
    fn session_state_survives_a_serde_round_trip() {
        let state = SessionState::Intake {
            step: IntakeStep::ConfirmAddress,
            draft: TicketDraft {
                category: Some(Category::Billing),
                address: Some("ул. Ленина 1".into()),
                media: None,
                description: None,
            },
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
