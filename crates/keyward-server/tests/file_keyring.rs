// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session over a real encrypted keyring file.

use std::sync::Arc;

use keyward_core::{Credential, KeyMaterial, KeyringContainer};
use keyward_server::{KeyringSession, UNLOCK_FAILURE_MESSAGE};
use keyward_test_utils::{RecordingNotifier, ScriptedPrompt};
use keyward_vault::{FileOpener, KdfParams, KeyringFile};
use secrecy::SecretString;

const CHEAP: KdfParams = KdfParams {
    memory_cost: 8192,
    iterations: 1,
    parallelism: 1,
};

#[tokio::test]
async fn writes_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring.json");
    KeyringFile::create(&path, &SecretString::from("master".to_string()), CHEAP)
        .await
        .unwrap();

    let session = Arc::new(KeyringSession::new(
        &path,
        Arc::new(FileOpener),
        Arc::new(ScriptedPrompt::always("master")),
        Arc::new(RecordingNotifier::new()),
    ));
    session
        .add_credential("mail".into(), Credential::new("alice", "hunter2"))
        .await
        .unwrap();
    session
        .add_key("mail".into(), KeyMaterial::new("ssh-key"))
        .await
        .unwrap();
    drop(session);

    let reopened = KeyringFile::open(&path, &SecretString::from("master".to_string()))
        .await
        .unwrap();
    assert_eq!(reopened.data().credential("mail").unwrap().password, "hunter2");
    assert_eq!(reopened.data().key("mail").unwrap().expose(), "ssh-key");
}

#[tokio::test]
async fn wrong_password_and_missing_file_notify() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring.json");
    KeyringFile::create(&path, &SecretString::from("master".to_string()), CHEAP)
        .await
        .unwrap();

    let notifier = RecordingNotifier::new();
    let session = Arc::new(KeyringSession::new(
        &path,
        Arc::new(FileOpener),
        Arc::new(ScriptedPrompt::always("guess")),
        Arc::new(notifier.clone()),
    ));
    assert!(session.get_key("x").await.is_err());
    assert_eq!(notifier.messages(), vec![UNLOCK_FAILURE_MESSAGE.to_string()]);

    let missing = Arc::new(KeyringSession::new(
        dir.path().join("absent.json"),
        Arc::new(FileOpener),
        Arc::new(ScriptedPrompt::always("master")),
        Arc::new(notifier.clone()),
    ));
    assert!(missing.get_key("x").await.is_err());
    assert_eq!(notifier.count(), 2);
}
