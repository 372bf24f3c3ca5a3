// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/keyward/keyward.toml`
//! 3. `~/.config/keyward/keyward.toml`
//! 4. `./keyward.toml`
//! 5. `KEYWARD_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeywardConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/keyward/keyward.toml";
pub const LOCAL_CONFIG_PATH: &str = "keyward.toml";

/// Candidate config files, lowest precedence first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("keyward").join("keyward.toml"));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
    paths
}

/// Build the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(KeywardConfig::default()));
    for path in config_file_candidates() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<KeywardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<KeywardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeywardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `KEYWARD_DAEMON_SOCKET_PATH` -> `daemon.socket_path`.
///
/// Only the first underscore after the section name becomes a dot, since
/// key names themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("KEYWARD_")
        .ignore(&["keyring_password"])
        .map(|key| {
            key.as_str()
                .replacen("daemon_", "daemon.", 1)
                .replacen("prompt_", "prompt.", 1)
                .replacen("vault_", "vault.", 1)
                .into()
        })
}
