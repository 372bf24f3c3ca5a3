// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the edges of the credential broker.
//!
//! The session and connection handlers only talk to these traits, so the
//! container format, the prompt and the notification surface can be swapped
//! (the test utilities provide in-memory fakes for all of them).

pub mod keyring;
pub mod prompt;

pub use keyring::{KeyringContainer, KeyringOpener};
pub use prompt::{ErrorNotifier, PasswordPrompt};
