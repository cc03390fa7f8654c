// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered TOML configuration for the Zayavka ticketing bot.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ZayavkaConfig;
pub use validation::validate;

/// Load from the standard hierarchy and validate, collecting all errors.
pub fn load_and_validate() -> Result<ZayavkaConfig, Vec<String>> {
    let config = load_config().map_err(|e| vec![e.to_string()])?;
    validate(&config)?;
    Ok(config)
}
