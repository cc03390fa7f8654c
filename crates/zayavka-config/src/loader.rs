// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, then `/etc/zayavka/zayavka.toml`, then
//! the user XDG config, then `./zayavka.toml`, then `ZAYAVKA_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ZayavkaConfig;

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<ZayavkaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZayavkaConfig::default()))
        .merge(Toml::file("/etc/zayavka/zayavka.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("zayavka/zayavka.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("zayavka.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (tests and diagnostics).
pub fn load_config_from_str(toml_content: &str) -> Result<ZayavkaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZayavkaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ZayavkaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZayavkaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys with
/// underscores stay unambiguous: `ZAYAVKA_BOT_LOG_LEVEL` must map to
/// `bot.log_level`, not `bot.log.level`.
fn env_provider() -> Env {
    Env::prefixed("ZAYAVKA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("bot_", "bot.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("hours_", "hours.", 1)
            .replacen("media_", "media.", 1)
            .replacen("geocode_", "geocode.", 1)
            .replacen("email_", "email.", 1)
            .replacen("report_", "report.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_file() {
        let config = load_config_from_str("").unwrap();
        assert!(config.bot.token.is_none());
        assert_eq!(config.hours.open_hour, 8);
        assert_eq!(config.hours.close_hour, 17);
        assert_eq!(config.media.staging_ttl_hours, 24);
    }

    #[test]
    fn toml_sections_override_defaults() {
        let config = load_config_from_str(
            r#"
            [bot]
            token = "123:abc"
            log_level = "debug"

            [hours]
            days = [0, 1, 2]
            open_hour = 9
            close_hour = 18
            "#,
        )
        .unwrap();
        assert_eq!(config.bot.token.as_deref(), Some("123:abc"));
        assert_eq!(config.bot.log_level, "debug");
        assert_eq!(config.hours.days, vec![0, 1, 2]);
        assert_eq!(config.hours.close_hour, 18);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [bot]
            tokne = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn hours_config_converts_to_gate() {
        let config = load_config_from_str("").unwrap();
        let hours = config.hours.to_operating_hours();
        assert_eq!(hours.days, vec![0, 1, 2, 3, 4]);
        assert_eq!(hours.close_hour, 17);
    }
}
