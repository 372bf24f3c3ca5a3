// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyward credential broker.

use thiserror::Error;

/// The primary error type used across Keyward crates.
#[derive(Debug, Error)]
pub enum KeywardError {
    /// Configuration errors (invalid TOML, bad paths, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Keyring container errors (malformed file, unsupported version, crypto setup).
    #[error("keyring error: {0}")]
    Keyring(String),

    /// A password was supplied but the keyring could not be opened with it.
    #[error("unable to access or decrypt keyring: {0}")]
    AuthFailure(String),

    /// The user declined to supply a password.
    #[error("password prompt cancelled")]
    PromptCancelled,

    /// Writing the keyring back to disk failed.
    #[error("failed to persist keyring: {0}")]
    Persist(String),

    /// Malformed frames or unexpected responses on the local socket.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Filesystem or socket I/O errors.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
