// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! Every struct rejects unknown keys so typos surface at startup instead of
//! being silently ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Keyward configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywardConfig {
    /// Socket, keyring location and logging.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// How the master password is collected.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Key derivation parameters for newly created keyrings.
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Daemon process settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Unix socket clients connect to.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Encrypted keyring container served by this process.
    #[serde(default = "default_keyring_path")]
    pub keyring_path: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            keyring_path: default_keyring_path(),
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(&self.socket_path)
    }

    pub fn keyring_path(&self) -> PathBuf {
        PathBuf::from(&self.keyring_path)
    }
}

fn default_socket_path() -> String {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("keyward")
        .join("keyward.sock")
        .to_string_lossy()
        .into_owned()
}

fn default_keyring_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("keyward").join("keyring.json"))
        .unwrap_or_else(|| PathBuf::from("keyring.json"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Password prompt settings.
///
/// With no `command` the daemon prompts on its controlling terminal (or reads
/// `KEYWARD_KEYRING_PASSWORD`). With a `command`, an askpass-style program is
/// run for every prompt and its first stdout line is the password.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Askpass program, e.g. `ssh-askpass`.
    #[serde(default)]
    pub command: Option<String>,

    /// Extra arguments passed before the prompt text.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Largest Argon2id memory cost accepted, in KiB (4 GiB).
pub const KDF_MAX_MEMORY_COST: u32 = 4 * 1024 * 1024;
/// Largest Argon2id iteration count accepted.
pub const KDF_MAX_ITERATIONS: u32 = 64;
/// Largest Argon2id lane count accepted.
pub const KDF_MAX_PARALLELISM: u32 = 64;

/// Argon2id parameters used when creating a keyring.
///
/// Existing keyrings carry their own parameters in the container header.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}
