// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk container format and the `KeyringOpener` seam.

use keyward_core::{Credential, KeyringContainer, KeyringOpener, KeywardError};
use keyward_vault::{FileOpener, KdfParams, KeyringFile};
use secrecy::SecretString;

const CHEAP: KdfParams = KdfParams {
    memory_cost: 8192,
    iterations: 1,
    parallelism: 1,
};

fn password(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

async fn fresh_keyring(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("keyring.json");
    KeyringFile::create(&path, &password("master"), CHEAP)
        .await
        .expect("create keyring");
    path
}

#[tokio::test]
async fn header_carries_version_and_kdf_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["kdf"]["memory_cost"], 8192);
    assert_eq!(doc["kdf"]["iterations"], 1);
    assert_eq!(doc["kdf"]["parallelism"], 1);
    for field in ["wrapped_key", "wrap_nonce", "payload", "payload_nonce"] {
        assert!(doc[field].is_string(), "missing {field}");
    }
    assert!(doc["kdf"]["salt"].is_string());
}

#[tokio::test]
async fn file_opener_returns_working_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    let mut container = FileOpener.open(&path, &password("master")).await.unwrap();
    container
        .data_mut()
        .set_credential("ftp", Credential::new("carol", "pa55"));
    container.sync().await.unwrap();

    let reopened = FileOpener.open(&path, &password("master")).await.unwrap();
    assert_eq!(reopened.data().credential("ftp").unwrap().username, "carol");
}

#[tokio::test]
async fn file_opener_rejects_wrong_password() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    let err = FileOpener.open(&path, &password("nope")).await.err().unwrap();
    assert!(matches!(err, KeywardError::AuthFailure(_)));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileOpener
        .open(&dir.path().join("absent.json"), &password("master"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, KeywardError::Io { .. }));
}

#[tokio::test]
async fn unsupported_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["version"] = serde_json::json!(2);
    std::fs::write(&path, doc.to_string()).unwrap();

    let err = KeyringFile::open(&path, &password("master")).await.unwrap_err();
    assert!(err.to_string().contains("unsupported keyring version 2"));
}

#[tokio::test]
async fn tampered_payload_fails_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    // A valid-length payload sealed under nothing in particular.
    doc["payload"] = serde_json::json!("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    std::fs::write(&path, doc.to_string()).unwrap();

    let err = KeyringFile::open(&path, &password("master")).await.unwrap_err();
    assert!(matches!(err, KeywardError::AuthFailure(_)));
}

#[tokio::test]
async fn garbage_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring.json");
    std::fs::write(&path, "not json").unwrap();

    let err = KeyringFile::open(&path, &password("master")).await.unwrap_err();
    assert!(matches!(err, KeywardError::Keyring(_)));
}

#[tokio::test]
async fn every_sync_uses_a_new_payload_nonce() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyring.json");
    let keyring = KeyringFile::create(&path, &password("master"), CHEAP)
        .await
        .unwrap();
    let before: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    keyring.sync().await.unwrap();
    let after: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_ne!(before["payload_nonce"], after["payload_nonce"]);
    assert_eq!(before["wrapped_key"], after["wrapped_key"]);
}

#[tokio::test]
async fn oversized_kdf_header_is_rejected_before_deriving() {
    let dir = tempfile::tempdir().unwrap();
    let path = fresh_keyring(&dir).await;

    for (field, value) in [
        ("memory_cost", u64::from(u32::MAX)),
        ("iterations", u64::from(u32::MAX)),
        ("parallelism", 0),
    ] {
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let original = doc["kdf"][field].clone();
        doc["kdf"][field] = serde_json::json!(value);
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = KeyringFile::open(&path, &password("master")).await.unwrap_err();
        assert!(
            matches!(&err, KeywardError::Keyring(m) if m.contains("out of range")),
            "{field}: {err}"
        );

        doc["kdf"][field] = original;
        std::fs::write(&path, doc.to_string()).unwrap();
    }

    assert!(KeyringFile::open(&path, &password("master")).await.is_ok());
}
