// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyward credential broker.
//!
//! Provides the error type, the decrypted keyring data model, and the traits
//! the daemon uses to reach its collaborators (container, prompt, notifier).

pub mod error;
pub mod traits;
pub mod types;

pub use error::KeywardError;
pub use traits::{ErrorNotifier, KeyringContainer, KeyringOpener, PasswordPrompt};
pub use types::{ConnectionId, Credential, KeyMaterial, KeyringData};
