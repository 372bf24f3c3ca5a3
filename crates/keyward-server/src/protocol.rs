// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol: one JSON object per line, tagged by `"type"`.
//!
//! ```text
//! -> {"type":"get_key","id":"gpg"}
//! <- {"type":"get_key","found":true,"has_value":true,"key":"..."}
//! ```
//!
//! Every request kind is answered by the response of the same kind. A frame
//! that cannot be decoded is answered with `{"type":"error","message":..}`.

use keyward_core::{Credential, KeyMaterial};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Greet,
    AddUsernamePassword {
        id: String,
        username: String,
        password: String,
    },
    GetUsernamePassword {
        id: String,
    },
    AddKey {
        id: String,
        key: String,
    },
    GetKey {
        id: String,
    },
}

impl Request {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Greet => "greet",
            Request::AddUsernamePassword { .. } => "add_username_password",
            Request::GetUsernamePassword { .. } => "get_username_password",
            Request::AddKey { .. } => "add_key",
            Request::GetKey { .. } => "get_key",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Request::Greet => None,
            Request::AddUsernamePassword { id, .. }
            | Request::GetUsernamePassword { id }
            | Request::AddKey { id, .. }
            | Request::GetKey { id } => Some(id.as_str()),
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Greet,
    AddUsernamePassword {
        success: bool,
    },
    GetUsernamePassword {
        found: bool,
        has_value: bool,
        username: String,
        password: String,
    },
    AddKey {
        success: bool,
    },
    GetKey {
        found: bool,
        has_value: bool,
        key: String,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn credential(credential: Option<Credential>) -> Self {
        match credential {
            Some(credential) => Response::GetUsernamePassword {
                found: true,
                has_value: true,
                username: credential.username.clone(),
                password: credential.password.clone(),
            },
            None => Response::GetUsernamePassword {
                found: true,
                has_value: false,
                username: String::new(),
                password: String::new(),
            },
        }
    }

    pub fn credential_unavailable() -> Self {
        Response::GetUsernamePassword {
            found: false,
            has_value: false,
            username: String::new(),
            password: String::new(),
        }
    }

    pub fn key(key: Option<KeyMaterial>) -> Self {
        Response::GetKey {
            found: true,
            has_value: key.is_some(),
            key: key.map(|k| k.expose().to_string()).unwrap_or_default(),
        }
    }

    pub fn key_unavailable() -> Self {
        Response::GetKey {
            found: false,
            has_value: false,
            key: String::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Response::Greet => "greet",
            Response::AddUsernamePassword { .. } => "add_username_password",
            Response::GetUsernamePassword { .. } => "get_username_password",
            Response::AddKey { .. } => "add_key",
            Response::GetKey { .. } => "get_key",
            Response::Error { .. } => "error",
        }
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::AddUsernamePassword { success } | Response::AddKey { success } => f
                .debug_struct("Response")
                .field("kind", &self.kind())
                .field("success", success)
                .finish(),
            Response::GetUsernamePassword {
                found, has_value, ..
            }
            | Response::GetKey {
                found, has_value, ..
            } => f
                .debug_struct("Response")
                .field("kind", &self.kind())
                .field("found", found)
                .field("has_value", has_value)
                .finish(),
            Response::Error { message } => f
                .debug_struct("Response")
                .field("kind", &self.kind())
                .field("message", message)
                .finish(),
            Response::Greet => f
                .debug_struct("Response")
                .field("kind", &self.kind())
                .finish(),
        }
    }
}

/// Result of a lookup as seen by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The keyring could not be unlocked.
    Unavailable,
    /// The keyring is unlocked but has no entry for the identifier.
    Missing,
    Found(T),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unavailable | Lookup::Missing => None,
        }
    }
}
