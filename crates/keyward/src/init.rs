// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward init`: create an empty keyring protected by a new password.

use keyward_config::model::KeywardConfig;
use keyward_core::KeywardError;
use keyward_vault::{KdfParams, KeyringFile, read_new_password_with_confirm};

pub async fn run_init(config: &KeywardConfig) -> Result<i32, KeywardError> {
    let path = config.daemon.keyring_path();
    if tokio::fs::try_exists(&path).await? {
        return Err(KeywardError::Keyring(format!(
            "{} already exists",
            path.display()
        )));
    }

    let password = tokio::task::spawn_blocking(read_new_password_with_confirm)
        .await
        .map_err(|e| KeywardError::Internal(format!("password prompt failed: {e}")))??;

    KeyringFile::create(&path, &password, KdfParams::from(&config.vault)).await?;
    eprintln!("keyward: created keyring at {}", path.display());
    Ok(0)
}
