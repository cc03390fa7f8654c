// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Zayavka ticketing bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use zayavka_core::OperatingHours;

/// Top-level Zayavka configuration.
///
/// Loaded from TOML with environment variable overrides. All sections are
/// optional and default to sensible values; only `bot.token` must be
/// supplied for `serve` to start.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZayavkaConfig {
    /// Telegram bot settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Operating days and hours for ticket intake.
    #[serde(default)]
    pub hours: HoursConfig,

    /// Media staging and permanent storage directories.
    #[serde(default)]
    pub media: MediaConfig,

    /// Reverse geocoding settings.
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// SMTP email notification settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Telegram Bot API token. Required for `serve`.
    #[serde(default)]
    pub token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Timeout for downloading media files from Telegram, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            log_level: default_log_level(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_download_timeout() -> u64 {
    120
}

/// SQLite storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("zayavka").join("zayavka.db"))
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| "zayavka.db".to_string())
}

/// Operating days and hours for ticket intake.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HoursConfig {
    /// Allowed weekdays, Monday = 0 .. Sunday = 6.
    #[serde(default = "default_days")]
    pub days: Vec<u8>,

    /// First allowed hour of day, inclusive.
    #[serde(default = "default_open_hour")]
    pub open_hour: u8,

    /// First disallowed hour of day, exclusive.
    #[serde(default = "default_close_hour")]
    pub close_hour: u8,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            open_hour: default_open_hour(),
            close_hour: default_close_hour(),
        }
    }
}

impl HoursConfig {
    /// Convert to the core gate type.
    pub fn to_operating_hours(&self) -> OperatingHours {
        OperatingHours {
            days: self.days.clone(),
            open_hour: self.open_hour,
            close_hour: self.close_hour,
        }
    }
}

fn default_days() -> Vec<u8> {
    vec![0, 1, 2, 3, 4]
}

fn default_open_hour() -> u8 {
    8
}

fn default_close_hour() -> u8 {
    17
}

/// Media staging and permanent storage directories.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Temporary directory for staged downloads.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Root directory for committed ticket/reply media.
    #[serde(default = "default_media_root")]
    pub media_root: String,

    /// Staged files older than this are removed by the sweep.
    #[serde(default = "default_staging_ttl")]
    pub staging_ttl_hours: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            media_root: default_media_root(),
            staging_ttl_hours: default_staging_ttl(),
        }
    }
}

fn default_staging_dir() -> String {
    "sources/temp".to_string()
}

fn default_media_root() -> String {
    "sources/media".to_string()
}

fn default_staging_ttl() -> u64 {
    24
}

/// Reverse geocoding settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodeConfig {
    /// Nominatim-compatible endpoint base URL.
    #[serde(default = "default_geocode_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_geocode_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_geocode_endpoint(),
            timeout_secs: default_geocode_timeout(),
        }
    }
}

fn default_geocode_endpoint() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocode_timeout() -> u64 {
    30
}

/// SMTP email notification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// SMTP host for the implicit-TLS submission port (465).
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// Sender address, also used as the login name.
    #[serde(default)]
    pub from_address: Option<String>,

    /// SMTP password. `None` disables email notifications.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            from_address: None,
            password: None,
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.yandex.ru".to_string()
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory XLSX reports are written to.
    #[serde(default = "default_reports_dir")]
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_reports_dir(),
        }
    }
}

fn default_reports_dir() -> String {
    "sources/reports".to_string()
}
