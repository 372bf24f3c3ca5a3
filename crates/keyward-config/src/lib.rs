// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keyward daemon.
//!
//! TOML files in the usual XDG locations are layered under `KEYWARD_*`
//! environment overrides, unknown keys are rejected, and failures are rendered
//! as miette diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = keyward_config::load_and_validate().expect("config errors");
//! println!("keyring: {}", config.daemon.keyring_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::KeywardConfig;

use std::path::Path;

/// Load from the standard hierarchy and validate.
pub fn load_and_validate() -> Result<KeywardConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources())
}

/// Load from an explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<KeywardConfig, Vec<ConfigError>> {
    let sources = std::fs::read_to_string(path)
        .map(|content| vec![(path.display().to_string(), content)])
        .unwrap_or_default();
    finish(loader::load_config_from_path(path), sources)
}

/// Load from a TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeywardConfig, Vec<ConfigError>> {
    let sources = vec![("<inline>".to_string(), toml_content.to_string())];
    finish(loader::load_config_from_str(toml_content), sources)
}

fn finish(
    loaded: Result<KeywardConfig, figment::Error>,
    sources: Vec<(String, String)>,
) -> Result<KeywardConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(
                keyring = config.daemon.keyring_path.as_str(),
                socket = config.daemon.socket_path.as_str(),
                "configuration loaded"
            );
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources)),
    }
}

/// Contents of every config file that exists, for error span lookup.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_file_candidates()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path))
                    .unwrap_or(path)
            } else {
                path
            };
            Some((display.display().to_string(), content))
        })
        .collect()
}
