// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted keyring storage for Keyward.
//!
//! Provides the file-backed keyring container (AES-256-GCM payload, master
//! key wrapped under an Argon2id-derived key), the password prompts used to
//! unlock it, and the log-based error notifier.

pub mod crypto;
pub mod kdf;
pub mod keyring;
pub mod notify;
pub mod prompt;

pub use kdf::KdfParams;
pub use keyring::{FileOpener, KeyringFile};
pub use notify::LogNotifier;
pub use prompt::{
    AskpassPrompt, KEYRING_PASSWORD_ENV_VAR, TerminalPrompt, prompt_from_config,
    read_new_password_with_confirm,
};
