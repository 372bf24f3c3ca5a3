// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use keyward_core::ErrorNotifier;

/// Reports unlock failures to the log and to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn show_error(&self, message: &str) {
        tracing::error!(notification = message, "keyring unlock failed");
        eprintln!("keyward: {message}");
    }
}
