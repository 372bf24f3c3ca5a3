// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Keyward collaborator traits.
//!
//! Fast, deterministic fakes so the unlock gate and the request protocol can
//! be exercised without a terminal, real key derivation, or a disk.
//!
//! # Components
//!
//! - [`ScriptedPrompt`] - answers from a script, counts calls, can be held open
//! - [`RecordingNotifier`] - captures every error shown to the user
//! - [`MemoryOpener`] - in-memory keyring with password check and failure injection

pub mod memory_keyring;
pub mod notifier;
pub mod prompt;

pub use memory_keyring::{MemoryKeyring, MemoryOpener};
pub use notifier::RecordingNotifier;
pub use prompt::ScriptedPrompt;
