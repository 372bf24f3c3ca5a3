// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over a real Unix socket.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use keyward_core::KeywardError;
use keyward_server::{ConnectionRegistry, KeyClient, KeyServer, KeyringSession, Lookup};
use keyward_test_utils::{MemoryOpener, RecordingNotifier, ScriptedPrompt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    _dir: tempfile::TempDir,
    socket: PathBuf,
    registry: Arc<ConnectionRegistry>,
    cancel: CancellationToken,
    server: JoinHandle<Result<(), KeywardError>>,
}

async fn start(opener: &MemoryOpener, prompt: &ScriptedPrompt) -> Running {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("run").join("keyward.sock");
    let session = Arc::new(KeyringSession::new(
        dir.path().join("keyring.json"),
        Arc::new(opener.clone()),
        Arc::new(prompt.clone()),
        Arc::new(RecordingNotifier::new()),
    ));
    let server = KeyServer::bind(&socket, session).await.unwrap();
    let registry = server.registry();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(server.run(cancel.clone()));
    Running {
        _dir: dir,
        socket,
        registry,
        cancel,
        server,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn round_trip_over_socket() {
    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;

    let mut client = KeyClient::connect(&running.socket).await.unwrap();
    client.greet().await.unwrap();
    assert!(
        client
            .add_username_password("mail", "alice", "hunter2")
            .await
            .unwrap()
    );
    assert!(client.add_key("gpg", "key-bytes").await.unwrap());

    match client.get_username_password("mail").await.unwrap() {
        Lookup::Found(cred) => {
            assert_eq!(cred.username, "alice");
            assert_eq!(cred.password, "hunter2");
        }
        other => panic!("unexpected lookup {other:?}"),
    }
    assert_eq!(
        client.get_key("gpg").await.unwrap().found().map(|k| k.expose().to_string()),
        Some("key-bytes".to_string())
    );
    assert_eq!(client.get_key("absent").await.unwrap(), Lookup::Missing);
}

#[tokio::test]
async fn cancelled_prompt_is_unavailable_not_missing() {
    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::cancelling()).await;

    let mut client = KeyClient::connect(&running.socket).await.unwrap();
    assert_eq!(client.get_key("anything").await.unwrap(), Lookup::Unavailable);
    assert!(!client.add_key("anything", "v").await.unwrap());
    client.greet().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_clients_trigger_one_prompt() {
    let opener = MemoryOpener::new("pw");
    let prompt = ScriptedPrompt::gated([Some("pw")]);
    let running = start(&opener, &prompt).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let socket = running.socket.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = KeyClient::connect(&socket).await.unwrap();
            client.get_key(&format!("k{i}")).await.unwrap()
        }));
    }

    prompt.wait_started().await;
    // Greet is served while the prompt is pending.
    let mut other = KeyClient::connect(&running.socket).await.unwrap();
    other.greet().await.unwrap();
    prompt.release();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Lookup::Missing);
    }
    assert_eq!(prompt.calls(), 1);
    assert_eq!(opener.opens(), 1);
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;

    let stream = UnixStream::connect(&running.socket).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"this is not json\n").await.unwrap();
    writer.write_all(b"{\"type\":\"greet\"}\n").await.unwrap();

    let first: serde_json::Value =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(first["type"], "error");
    assert_eq!(second["type"], "greet");
}

#[tokio::test]
async fn disconnect_mid_write_still_persists() {
    let opener = MemoryOpener::new("pw");
    opener.set_sync_delay(Some(Duration::from_millis(100)));
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;

    {
        let mut stream = UnixStream::connect(&running.socket).await.unwrap();
        stream
            .write_all(b"{\"type\":\"add_key\",\"id\":\"k\",\"key\":\"v\"}\n")
            .await
            .unwrap();
        stream.flush().await.unwrap();
        wait_until(|| opener.opens() == 1).await;
    }

    wait_until(|| opener.syncs() == 1).await;
    wait_until(|| running.registry.is_empty()).await;
    assert_eq!(opener.persisted().key("k").unwrap().expose(), "v");

    let mut client = KeyClient::connect(&running.socket).await.unwrap();
    assert!(client.get_key("k").await.unwrap().found().is_some());
}

#[tokio::test]
async fn dropped_connection_does_not_disturb_others_in_flight() {
    let opener = MemoryOpener::new("pw");
    opener.set_sync_delay(Some(Duration::from_millis(100)));
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;

    let mut b = KeyClient::connect(&running.socket).await.unwrap();
    b.greet().await.unwrap();

    let mut a = UnixStream::connect(&running.socket).await.unwrap();
    a.write_all(b"{\"type\":\"add_key\",\"id\":\"a\",\"key\":\"from-a\"}\n")
        .await
        .unwrap();
    a.flush().await.unwrap();
    wait_until(|| opener.opens() == 1).await;
    assert_eq!(running.registry.len(), 2);

    // B queues behind A's slow sync on the same keyring.
    let in_flight = tokio::spawn(async move {
        let stored = b.add_key("b", "from-b").await.unwrap();
        (b, stored)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(a);

    let (mut b, stored) = in_flight.await.unwrap();
    assert!(stored);
    assert_eq!(
        b.get_key("b")
            .await
            .unwrap()
            .found()
            .map(|k| k.expose().to_string()),
        Some("from-b".to_string())
    );

    wait_until(|| running.registry.len() == 1).await;
    let persisted = opener.persisted();
    assert_eq!(persisted.key("a").unwrap().expose(), "from-a");
    assert_eq!(persisted.key("b").unwrap().expose(), "from-b");
}

#[tokio::test]
async fn registry_follows_connection_lifecycle() {
    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;

    let mut a = KeyClient::connect(&running.socket).await.unwrap();
    let mut b = KeyClient::connect(&running.socket).await.unwrap();
    a.greet().await.unwrap();
    b.greet().await.unwrap();
    assert_eq!(running.registry.len(), 2);

    drop(a);
    wait_until(|| running.registry.len() == 1).await;
    drop(b);
    wait_until(|| running.registry.is_empty()).await;
}

#[cfg(unix)]
#[tokio::test]
async fn socket_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;
    let mode = std::fs::metadata(&running.socket).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn stale_socket_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("keyward.sock");
    std::fs::write(&socket, b"stale").unwrap();

    let session = Arc::new(KeyringSession::new(
        dir.path().join("keyring.json"),
        Arc::new(MemoryOpener::new("pw")),
        Arc::new(ScriptedPrompt::cancelling()),
        Arc::new(RecordingNotifier::new()),
    ));
    let server = KeyServer::bind(&socket, session).await.unwrap();
    assert_eq!(server.socket_path(), socket.as_path());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(server.run(cancel.clone()));

    let mut client = KeyClient::connect(&socket).await.unwrap();
    client.greet().await.unwrap();

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_clients_and_removes_socket() {
    let opener = MemoryOpener::new("pw");
    let running = start(&opener, &ScriptedPrompt::always("pw")).await;
    let mut client = KeyClient::connect(&running.socket).await.unwrap();
    client.greet().await.unwrap();

    running.cancel.cancel();
    running.server.await.unwrap().unwrap();

    assert!(!running.socket.exists());
    assert!(running.registry.is_empty());
    assert!(client.greet().await.is_err());
}
