// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic validation of a loaded configuration.
//!
//! Figment catches shape errors; this pass catches values that parse but
//! cannot work, reporting all problems at once.

use crate::model::ZayavkaConfig;

/// Validate a loaded config, returning every problem found.
pub fn validate(config: &ZayavkaConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(token) = &config.bot.token
        && token.is_empty()
    {
        errors.push("bot.token must not be empty when set".to_string());
    }

    if config.hours.open_hour >= config.hours.close_hour {
        errors.push(format!(
            "hours.open_hour ({}) must be before hours.close_hour ({})",
            config.hours.open_hour, config.hours.close_hour
        ));
    }
    if config.hours.close_hour > 24 {
        errors.push(format!(
            "hours.close_hour ({}) must be at most 24",
            config.hours.close_hour
        ));
    }
    if config.hours.days.is_empty() {
        errors.push("hours.days must list at least one weekday".to_string());
    }
    for day in &config.hours.days {
        if *day > 6 {
            errors.push(format!("hours.days entry {day} is out of range 0..=6"));
        }
    }

    if config.email.from_address.is_some() && config.email.password.is_none() {
        errors.push(
            "email.password is required when email.from_address is set".to_string(),
        );
    }

    if config.media.staging_dir == config.media.media_root {
        errors.push(
            "media.staging_dir and media.media_root must be distinct directories".to_string(),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
