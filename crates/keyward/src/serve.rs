// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward serve` command implementation.
//!
//! Wires the file-backed keyring, the configured password prompt and the log
//! notifier into a [`KeyringSession`], then serves it on the Unix socket
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use keyward_config::model::KeywardConfig;
use keyward_core::{KeywardError, PasswordPrompt};
use keyward_server::{KeyServer, KeyringSession, install_signal_handler};
use keyward_vault::{FileOpener, LogNotifier, prompt_from_config};
use tracing::{info, warn};

pub async fn run_serve(config: KeywardConfig) -> Result<i32, KeywardError> {
    init_tracing(&config.daemon.log_level);

    let keyring_path = config.daemon.keyring_path();
    if !tokio::fs::try_exists(&keyring_path).await? {
        warn!(
            path = %keyring_path.display(),
            "keyring does not exist yet, create it with `keyward init`"
        );
    }

    let prompt: Arc<dyn PasswordPrompt> = Arc::from(prompt_from_config(&config.prompt));
    let session = Arc::new(KeyringSession::new(
        keyring_path,
        Arc::new(FileOpener),
        prompt,
        Arc::new(LogNotifier),
    ));

    let server = KeyServer::bind(config.daemon.socket_path(), session).await?;
    info!(version = env!("CARGO_PKG_VERSION"), "keyward serving");

    let cancel = install_signal_handler();
    server.run(cancel).await?;

    info!("keyward stopped");
    Ok(0)
}

/// Tracing to stderr; `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyward={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
