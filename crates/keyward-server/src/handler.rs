// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection request handling.

use std::sync::Arc;

use keyward_core::{ConnectionId, Credential, KeyMaterial};
use tracing::{debug, warn};

use crate::protocol::{Request, Response};
use crate::session::KeyringSession;

/// Translates requests from one client into session operations.
///
/// Holds no keyring state of its own; every connection shares the same
/// [`KeyringSession`].
pub struct ConnectionHandler {
    id: ConnectionId,
    session: Arc<KeyringSession>,
}

impl ConnectionHandler {
    pub fn new(id: ConnectionId, session: Arc<KeyringSession>) -> Self {
        Self { id, session }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Decode one frame and answer it. Undecodable frames get an error
    /// response.
    pub async fn handle_frame(&self, frame: &str) -> Response {
        match serde_json::from_str::<Request>(frame) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(connection_id = %self.id, error = %e, "malformed request");
                Response::Error {
                    message: format!("malformed request: {e}"),
                }
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!(
            connection_id = %self.id,
            request = request.kind(),
            id = request.id().unwrap_or_default(),
            "handling request"
        );

        let response = match request {
            Request::Greet => Response::Greet,
            Request::AddUsernamePassword {
                id,
                username,
                password,
            } => {
                let credential = Credential::new(username, password);
                Response::AddUsernamePassword {
                    success: self.session.add_credential(id, credential).await.is_ok(),
                }
            }
            Request::GetUsernamePassword { id } => match self.session.get_credential(&id).await {
                Ok(credential) => Response::credential(credential),
                Err(_) => Response::credential_unavailable(),
            },
            Request::AddKey { id, key } => Response::AddKey {
                success: self.session.add_key(id, KeyMaterial::new(key)).await.is_ok(),
            },
            Request::GetKey { id } => match self.session.get_key(&id).await {
                Ok(key) => Response::key(key),
                Err(_) => Response::key_unavailable(),
            },
        };

        debug!(connection_id = %self.id, response = ?response, "request handled");
        response
    }
}
