// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyring data model and common identifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identifier assigned to a client connection when it attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A username/password entry.
///
/// Both fields are wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opaque key material stored in the key namespace.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// The decrypted contents of one keyring container.
///
/// Two independent namespaces: an identifier present in `credentials` says
/// nothing about `keys`, and vice versa. The serialized field names match
/// the on-disk payload layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringData {
    #[serde(rename = "username", default)]
    pub credentials: BTreeMap<String, Credential>,
    #[serde(rename = "key", default)]
    pub keys: BTreeMap<String, KeyMaterial>,
}

impl KeyringData {
    pub fn credential(&self, id: &str) -> Option<&Credential> {
        self.credentials.get(id)
    }

    pub fn key(&self, id: &str) -> Option<&KeyMaterial> {
        self.keys.get(id)
    }

    /// Insert or overwrite a credential, returning the previous entry.
    pub fn set_credential(&mut self, id: &str, credential: Credential) -> Option<Credential> {
        self.credentials.insert(id.to_string(), credential)
    }

    /// Insert or overwrite a key, returning the previous entry.
    pub fn set_key(&mut self, id: &str, key: KeyMaterial) -> Option<KeyMaterial> {
        self.keys.insert(id.to_string(), key)
    }

    /// Put back the state captured by a previous `set_credential`.
    pub fn restore_credential(&mut self, id: &str, previous: Option<Credential>) {
        match previous {
            Some(credential) => {
                self.credentials.insert(id.to_string(), credential);
            }
            None => {
                self.credentials.remove(id);
            }
        }
    }

    /// Put back the state captured by a previous `set_key`.
    pub fn restore_key(&mut self, id: &str, previous: Option<KeyMaterial>) {
        match previous {
            Some(key) => {
                self.keys.insert(id.to_string(), key);
            }
            None => {
                self.keys.remove(id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty() && self.keys.is_empty()
    }
}
