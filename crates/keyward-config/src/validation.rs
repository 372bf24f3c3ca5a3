// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{
    KDF_MAX_ITERATIONS, KDF_MAX_MEMORY_COST, KDF_MAX_PARALLELISM, KeywardConfig,
};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first.
pub fn validate_config(config: &KeywardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.daemon.socket_path.trim().is_empty() {
        errors.push(ConfigError::validation("daemon.socket_path must not be empty"));
    }

    if config.daemon.keyring_path.trim().is_empty() {
        errors.push(ConfigError::validation("daemon.keyring_path must not be empty"));
    }

    if !config.daemon.socket_path.trim().is_empty()
        && config.daemon.socket_path == config.daemon.keyring_path
    {
        errors.push(ConfigError::validation(
            "daemon.socket_path and daemon.keyring_path must differ",
        ));
    }

    if !LOG_LEVELS.contains(&config.daemon.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "daemon.log_level `{}` is not one of {}",
            config.daemon.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(command) = &config.prompt.command {
        if command.trim().is_empty() {
            errors.push(ConfigError::validation(
                "prompt.command must not be empty when set",
            ));
        }
    }

    if config.vault.kdf_memory_cost < 32768 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            config.vault.kdf_memory_cost
        )));
    }

    if config.vault.kdf_iterations < 2 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            config.vault.kdf_iterations
        )));
    }

    if config.vault.kdf_parallelism < 1 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_parallelism must be at least 1, got {}",
            config.vault.kdf_parallelism
        )));
    }

    if config.vault.kdf_memory_cost > KDF_MAX_MEMORY_COST
        || config.vault.kdf_iterations > KDF_MAX_ITERATIONS
        || config.vault.kdf_parallelism > KDF_MAX_PARALLELISM
    {
        errors.push(ConfigError::validation(format!(
            "vault KDF parameters exceed the limits (memory_cost <= {KDF_MAX_MEMORY_COST}, \
             iterations <= {KDF_MAX_ITERATIONS}, parallelism <= {KDF_MAX_PARALLELISM})"
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KeywardConfig::default()).is_ok());
    }

    #[test]
    fn empty_keyring_path_fails() {
        let mut config = KeywardConfig::default();
        config.daemon.keyring_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "keyring_path"));
    }

    #[test]
    fn unknown_log_level_fails() {
        let mut config = KeywardConfig::default();
        config.daemon.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "log_level"));
    }

    #[test]
    fn weak_kdf_parameters_are_all_reported() {
        let mut config = KeywardConfig::default();
        config.vault.kdf_memory_cost = 1024;
        config.vault.kdf_iterations = 1;
        config.vault.kdf_parallelism = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn oversized_kdf_parameters_fail() {
        let mut config = KeywardConfig::default();
        config.vault.kdf_memory_cost = u32::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "exceed the limits"));
    }

    #[test]
    fn socket_and_keyring_must_differ() {
        let mut config = KeywardConfig::default();
        config.daemon.socket_path = "/tmp/same".to_string();
        config.daemon.keyring_path = "/tmp/same".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must differ"));
    }

    #[test]
    fn blank_prompt_command_fails() {
        let mut config = KeywardConfig::default();
        config.prompt.command = Some(String::new());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "prompt.command"));
    }
}
