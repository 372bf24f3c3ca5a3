// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory keyring container with failure injection.
//!
//! `MemoryOpener` plays the role of the encrypted file: the "disk" is a
//! shared `KeyringData` snapshot that only changes when a container syncs.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keyward_core::{KeyringContainer, KeyringData, KeyringOpener, KeywardError};
use secrecy::{ExposeSecret, SecretString};

#[derive(Default)]
struct Disk {
    persisted: Mutex<KeyringData>,
    fail_sync: AtomicBool,
    panic_on_open: AtomicBool,
    panic_on_sync: AtomicBool,
    sync_delay: Mutex<Option<Duration>>,
    opens: AtomicUsize,
    syncs: AtomicUsize,
}

/// Opens [`MemoryKeyring`]s protected by a fixed password.
#[derive(Clone)]
pub struct MemoryOpener {
    password: String,
    disk: Arc<Disk>,
}

impl MemoryOpener {
    pub fn new(password: &str) -> Self {
        Self::with_data(password, KeyringData::default())
    }

    /// Start from existing persisted contents.
    pub fn with_data(password: &str, data: KeyringData) -> Self {
        let disk = Disk {
            persisted: Mutex::new(data),
            ..Disk::default()
        };
        Self {
            password: password.to_string(),
            disk: Arc::new(disk),
        }
    }

    /// Make every subsequent `sync` fail with a persist error.
    pub fn set_fail_sync(&self, fail: bool) {
        self.disk.fail_sync.store(fail, Ordering::SeqCst);
    }

    /// Make `open` panic, simulating an unlock task that dies without
    /// reporting.
    pub fn set_panic_on_open(&self, panic: bool) {
        self.disk.panic_on_open.store(panic, Ordering::SeqCst);
    }

    /// Make `sync` panic before anything reaches the "disk".
    pub fn set_panic_on_sync(&self, panic: bool) {
        self.disk.panic_on_sync.store(panic, Ordering::SeqCst);
    }

    /// Delay every `sync` before it commits.
    pub fn set_sync_delay(&self, delay: Option<Duration>) {
        if let Ok(mut slot) = self.disk.sync_delay.lock() {
            *slot = delay;
        }
    }

    /// Number of `open` calls, successful or not.
    pub fn opens(&self) -> usize {
        self.disk.opens.load(Ordering::SeqCst)
    }

    /// Number of successful `sync` calls.
    pub fn syncs(&self) -> usize {
        self.disk.syncs.load(Ordering::SeqCst)
    }

    /// What the last successful `sync` wrote.
    pub fn persisted(&self) -> KeyringData {
        self.disk
            .persisted
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl KeyringOpener for MemoryOpener {
    async fn open(
        &self,
        _path: &Path,
        password: &SecretString,
    ) -> Result<Box<dyn KeyringContainer>, KeywardError> {
        self.disk.opens.fetch_add(1, Ordering::SeqCst);
        if self.disk.panic_on_open.load(Ordering::SeqCst) {
            panic!("injected open panic");
        }
        if password.expose_secret() != self.password {
            return Err(KeywardError::AuthFailure("wrong password".to_string()));
        }
        Ok(Box::new(MemoryKeyring {
            data: self.persisted(),
            disk: Arc::clone(&self.disk),
        }))
    }
}

/// A decrypted in-memory keyring.
pub struct MemoryKeyring {
    data: KeyringData,
    disk: Arc<Disk>,
}

#[async_trait]
impl KeyringContainer for MemoryKeyring {
    fn data(&self) -> &KeyringData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut KeyringData {
        &mut self.data
    }

    async fn sync(&self) -> Result<(), KeywardError> {
        let delay = self.disk.sync_delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.disk.panic_on_sync.load(Ordering::SeqCst) {
            panic!("injected sync panic");
        }
        if self.disk.fail_sync.load(Ordering::SeqCst) {
            return Err(KeywardError::Persist("injected sync failure".to_string()));
        }
        if let Ok(mut persisted) = self.disk.persisted.lock() {
            *persisted = self.data.clone();
        }
        self.disk.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyward_core::KeyMaterial;

    fn pw(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn wrong_password_fails() {
        let opener = MemoryOpener::new("right");
        let result = opener.open(Path::new("unused"), &pw("wrong")).await;
        assert!(matches!(result, Err(KeywardError::AuthFailure(_))));
        assert_eq!(opener.opens(), 1);
    }

    #[tokio::test]
    async fn sync_commits_to_disk() {
        let opener = MemoryOpener::new("pw");
        let mut keyring = opener.open(Path::new("unused"), &pw("pw")).await.unwrap();
        keyring.data_mut().set_key("k", KeyMaterial::new("v"));
        assert!(opener.persisted().key("k").is_none());

        keyring.sync().await.unwrap();
        assert_eq!(opener.persisted().key("k").unwrap().expose(), "v");
        assert_eq!(opener.syncs(), 1);
    }

    #[tokio::test]
    async fn injected_sync_failure_keeps_disk_unchanged() {
        let opener = MemoryOpener::new("pw");
        let mut keyring = opener.open(Path::new("unused"), &pw("pw")).await.unwrap();
        opener.set_fail_sync(true);
        keyring.data_mut().set_key("k", KeyMaterial::new("v"));

        assert!(matches!(keyring.sync().await, Err(KeywardError::Persist(_))));
        assert!(opener.persisted().is_empty());
        assert_eq!(opener.syncs(), 0);
    }
}
