// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed encrypted keyring.
//!
//! The container uses a key-wrapping pattern:
//! - A random master key encrypts the JSON payload holding both namespaces.
//! - The master key is encrypted with a key derived from the master password
//!   via Argon2id; salt and cost parameters live in the file header.
//!
//! Every `sync` re-seals the payload under a fresh nonce and atomically
//! replaces the file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use keyward_core::{KeyringContainer, KeyringData, KeyringOpener, KeywardError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, NONCE_LEN};
use crate::kdf::{self, KdfParams, SALT_LEN};

/// Container format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KdfHeader {
    salt: String,
    #[serde(flatten)]
    params: KdfParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContainerDocument {
    version: u32,
    kdf: KdfHeader,
    wrapped_key: String,
    wrap_nonce: String,
    payload: String,
    payload_nonce: String,
}

/// An unlocked keyring container.
///
/// Debug output omits the master key and the decrypted entries.
pub struct KeyringFile {
    path: PathBuf,
    master_key: Zeroizing<[u8; KEY_LEN]>,
    kdf: KdfHeader,
    wrapped_key: String,
    wrap_nonce: String,
    data: KeyringData,
}

impl std::fmt::Debug for KeyringFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringFile")
            .field("path", &self.path)
            .field("master_key", &"[REDACTED]")
            .field("credentials", &self.data.credentials.len())
            .field("keys", &self.data.keys.len())
            .finish()
    }
}

impl KeyringFile {
    /// Create a new, empty keyring at `path` protected by `password`.
    ///
    /// Fails if the file already exists.
    pub async fn create(
        path: &Path,
        password: &SecretString,
        params: KdfParams,
    ) -> Result<Self, KeywardError> {
        params.check_limits()?;
        if tokio::fs::try_exists(path).await? {
            return Err(KeywardError::Keyring(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let master_key = crypto::generate_key()?;
        let salt = kdf::generate_salt()?;
        let wrapping_key = derive_off_thread(password, salt, params).await?;
        let (wrapped_key, wrap_nonce) = crypto::seal(&wrapping_key, &master_key[..])?;

        let keyring = Self {
            path: path.to_path_buf(),
            master_key,
            kdf: KdfHeader {
                salt: STANDARD.encode(salt),
                params,
            },
            wrapped_key: STANDARD.encode(wrapped_key),
            wrap_nonce: STANDARD.encode(wrap_nonce),
            data: KeyringData::default(),
        };
        keyring.write().await?;

        info!(path = %path.display(), "keyring created");
        Ok(keyring)
    }

    /// Open and decrypt the keyring at `path`.
    ///
    /// A wrong password or a modified file yields
    /// [`KeywardError::AuthFailure`]. Header KDF parameters outside the
    /// accepted limits are rejected before deriving.
    pub async fn open(path: &Path, password: &SecretString) -> Result<Self, KeywardError> {
        let bytes = tokio::fs::read(path).await?;
        let doc: ContainerDocument = serde_json::from_slice(&bytes)
            .map_err(|e| KeywardError::Keyring(format!("malformed keyring file: {e}")))?;
        if doc.version != FORMAT_VERSION {
            return Err(KeywardError::Keyring(format!(
                "unsupported keyring version {}",
                doc.version
            )));
        }
        doc.kdf.params.check_limits()?;

        let salt: [u8; SALT_LEN] = decode_array("kdf.salt", &doc.kdf.salt)?;
        let wrap_nonce: [u8; NONCE_LEN] = decode_array("wrap_nonce", &doc.wrap_nonce)?;
        let payload_nonce: [u8; NONCE_LEN] = decode_array("payload_nonce", &doc.payload_nonce)?;
        let wrapped_key = decode("wrapped_key", &doc.wrapped_key)?;
        let payload = decode("payload", &doc.payload)?;

        let wrapping_key = derive_off_thread(password, salt, doc.kdf.params).await?;
        let unwrapped = crypto::open(&wrapping_key, &wrap_nonce, &wrapped_key).map_err(|_| {
            KeywardError::AuthFailure("wrong password or corrupted keyring".to_string())
        })?;
        let master_key: [u8; KEY_LEN] = unwrapped
            .as_slice()
            .try_into()
            .map_err(|_| KeywardError::Keyring("wrapped key has the wrong length".to_string()))?;
        let master_key = Zeroizing::new(master_key);

        let plaintext = crypto::open(&master_key, &payload_nonce, &payload)?;
        let data: KeyringData = serde_json::from_slice(&plaintext)
            .map_err(|e| KeywardError::Keyring(format!("malformed keyring payload: {e}")))?;

        debug!(
            path = %path.display(),
            credentials = data.credentials.len(),
            keys = data.keys.len(),
            "keyring decrypted"
        );
        Ok(Self {
            path: path.to_path_buf(),
            master_key,
            kdf: doc.kdf,
            wrapped_key: doc.wrapped_key,
            wrap_nonce: doc.wrap_nonce,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self) -> Result<(), KeywardError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(&self.data)
                .map_err(|e| KeywardError::Persist(format!("payload encoding failed: {e}")))?,
        );
        let (payload, payload_nonce) = crypto::seal(&self.master_key, &plaintext)?;

        let doc = ContainerDocument {
            version: FORMAT_VERSION,
            kdf: self.kdf.clone(),
            wrapped_key: self.wrapped_key.clone(),
            wrap_nonce: self.wrap_nonce.clone(),
            payload: STANDARD.encode(payload),
            payload_nonce: STANDARD.encode(payload_nonce),
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| KeywardError::Persist(format!("container encoding failed: {e}")))?;

        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| KeywardError::Persist(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl KeyringContainer for KeyringFile {
    fn data(&self) -> &KeyringData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut KeyringData {
        &mut self.data
    }

    async fn sync(&self) -> Result<(), KeywardError> {
        self.write().await?;
        debug!(path = %self.path.display(), "keyring synced");
        Ok(())
    }
}

/// [`KeyringOpener`] backed by [`KeyringFile`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileOpener;

#[async_trait]
impl KeyringOpener for FileOpener {
    async fn open(
        &self,
        path: &Path,
        password: &SecretString,
    ) -> Result<Box<dyn KeyringContainer>, KeywardError> {
        let keyring = KeyringFile::open(path, password).await?;
        Ok(Box::new(keyring))
    }
}

/// Argon2id is CPU and memory heavy; keep it off the async workers.
async fn derive_off_thread(
    password: &SecretString,
    salt: [u8; SALT_LEN],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeywardError> {
    let password = Zeroizing::new(password.expose_secret().as_bytes().to_vec());
    tokio::task::spawn_blocking(move || kdf::derive_key(&password, &salt, &params))
        .await
        .map_err(|e| KeywardError::Internal(format!("key derivation task failed: {e}")))?
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>, KeywardError> {
    STANDARD
        .decode(value)
        .map_err(|e| KeywardError::Keyring(format!("invalid base64 in `{field}`: {e}")))
}

fn decode_array<const N: usize>(field: &str, value: &str) -> Result<[u8; N], KeywardError> {
    decode(field, value)?.try_into().map_err(|bytes: Vec<u8>| {
        KeywardError::Keyring(format!(
            "`{field}` must be {N} bytes, found {}",
            bytes.len()
        ))
    })
}

/// Write to `<path>.tmp`, fsync, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
    }
    tokio::fs::rename(&tmp, path).await
}
