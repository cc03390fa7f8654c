// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operating-hours gate for ticket intake.
//!
//! Intake may only be entered on configured weekdays within a half-open
//! hour interval `[open, close)`. Timestamps are evaluated in the fixed
//! local offset the rest of the system records in.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

/// Fixed local offset for all recorded timestamps (UTC+3).
pub const LOCAL_OFFSET_HOURS: i32 = 3;

/// The fixed offset used across the system.
pub fn local_offset() -> FixedOffset {
    // 3600 * 3 is always in range.
    FixedOffset::east_opt(LOCAL_OFFSET_HOURS * 3600).expect("valid fixed offset")
}

/// Current time in the system's fixed local offset.
pub fn local_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&local_offset())
}

/// Allowed weekdays and a half-open hour window for intake entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatingHours {
    /// Allowed weekdays, Monday = 0 .. Sunday = 6.
    pub days: Vec<u8>,
    /// First allowed hour of day (inclusive).
    pub open_hour: u8,
    /// First disallowed hour of day (exclusive).
    pub close_hour: u8,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            days: vec![0, 1, 2, 3, 4],
            open_hour: 8,
            close_hour: 17,
        }
    }
}

/// Why intake entry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    /// Today is not an operating day.
    OffDay,
    /// Outside the `[open, close)` hour window.
    OffHours,
}

impl OperatingHours {
    /// Check whether intake may be entered at `now`.
    ///
    /// The closing hour itself is rejected: with `close_hour = 17`, entry
    /// at 17:00 fails while 16:59 succeeds.
    pub fn check(&self, now: DateTime<FixedOffset>) -> Result<(), ClosedReason> {
        let weekday = now.weekday().num_days_from_monday() as u8;
        if !self.days.contains(&weekday) {
            return Err(ClosedReason::OffDay);
        }
        let hour = now.hour() as u8;
        if hour < self.open_hour || hour >= self.close_hour {
            return Err(ClosedReason::OffHours);
        }
        Ok(())
    }
}
