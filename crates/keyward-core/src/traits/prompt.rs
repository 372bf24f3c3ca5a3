// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-facing collaborators: password prompt and error notification.

use async_trait::async_trait;
use secrecy::SecretString;

/// Collects the master password from a human.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    /// Ask for the password. `None` means the user cancelled (or no prompt
    /// surface was available), which is not a fault.
    async fn collect(&self) -> Option<SecretString>;
}

/// Fire-and-forget sink for user-visible error messages.
pub trait ErrorNotifier: Send + Sync {
    fn show_error(&self, message: &str);
}
