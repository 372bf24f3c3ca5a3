// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unix domain socket server.
//!
//! Each accepted connection is registered, served in its own task, and
//! removed from the registry when the client hangs up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use keyward_core::KeywardError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::handler::ConnectionHandler;
use crate::registry::ConnectionRegistry;
use crate::session::KeyringSession;

/// The broker's socket front end.
pub struct KeyServer {
    socket_path: PathBuf,
    listener: UnixListener,
    session: Arc<KeyringSession>,
    registry: Arc<ConnectionRegistry>,
}

impl KeyServer {
    /// Bind the socket, replacing a stale one, and restrict it to the owner.
    pub async fn bind(
        socket_path: impl Into<PathBuf>,
        session: Arc<KeyringSession>,
    ) -> Result<Self, KeywardError> {
        let socket_path = socket_path.into();
        if let Some(parent) = socket_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        if tokio::fs::try_exists(&socket_path).await? {
            debug!(socket = %socket_path.display(), "removing stale socket");
            tokio::fs::remove_file(&socket_path).await?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        info!(socket = %socket_path.display(), "listening");
        Ok(Self {
            socket_path,
            listener,
            session,
            registry: Arc::new(ConnectionRegistry::new()),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections until `cancel` fires, then close every
    /// connection and remove the socket file.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), KeywardError> {
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => {
                    let stream = match accepted {
                        Ok((stream, _addr)) => stream,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let handler = self.registry.register(Arc::clone(&self.session));
                    let registry = Arc::clone(&self.registry);
                    let cancel = cancel.clone();
                    tracker.spawn(async move {
                        serve_connection(stream, handler, registry, cancel).await;
                    });
                }
            }
        }

        info!(connections = self.registry.len(), "shutting down");
        tracker.close();
        tracker.wait().await;
        drop(self.listener);

        match tokio::fs::remove_file(&self.socket_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn serve_connection(
    stream: UnixStream,
    handler: Arc<ConnectionHandler>,
    registry: Arc<ConnectionRegistry>,
    cancel: CancellationToken,
) {
    let id = handler.id();
    info!(connection_id = %id, "client connected");

    tokio::select! {
        result = pump(stream, &handler) => {
            if let Err(e) = result {
                debug!(connection_id = %id, error = %e, "connection closed with error");
            }
        }
        _ = cancel.cancelled() => {
            debug!(connection_id = %id, "closing connection for shutdown");
        }
    }

    registry.remove(id);
    info!(connection_id = %id, remaining = registry.len(), "client disconnected");
}

/// Answer frames in order until EOF.
async fn pump(stream: UnixStream, handler: &ConnectionHandler) -> Result<(), KeywardError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = Zeroizing::new(line);
        if line.trim().is_empty() {
            continue;
        }

        let response = handler.handle_frame(&line).await;
        let mut frame = Zeroizing::new(
            serde_json::to_string(&response)
                .map_err(|e| KeywardError::Protocol(format!("failed to encode response: {e}")))?,
        );
        frame.push('\n');
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
