// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function is a single auto-committing
//! statement (or a read plus its row mapping); no multi-statement
//! transaction spans module boundaries.

pub mod attachments;
pub mod profiles;
pub mod sessions;
pub mod tickets;
