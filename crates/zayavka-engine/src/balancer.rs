// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Load-balanced ticket assignment.
//!
//! Selection is a single repository query: the staff member with the
//! fewest open tickets, ties broken by the oldest open-ticket timestamp
//! (staff with no open tickets sort first). The pick is advisory -- two
//! concurrent intakes may land on the same staff member, which only skews
//! the balance by one and self-corrects on the next pick.

use std::sync::Arc;

use tracing::{debug, warn};
use zayavka_core::{ChatId, ProfileId, TicketStore, ZayavkaError};

/// Thin wrapper around the repository's assignment query.
#[derive(Clone)]
pub struct Balancer {
    tickets: Arc<dyn TicketStore>,
}

impl Balancer {
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Pick the least-loaded staff member. `None` means no staff profiles
    /// exist; callers must fail the intake rather than create an
    /// unassigned ticket.
    pub async fn pick(&self) -> Result<Option<(ProfileId, ChatId)>, ZayavkaError> {
        let pick = self.tickets.pick_assignee().await?;
        match &pick {
            Some((assignee, chat)) => {
                debug!(assignee = assignee.0, chat = %chat, "assignee picked");
            }
            None => warn!("no staff profiles exist, assignment impossible"),
        }
        Ok(pick)
    }
}
