// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted keyring container traits.

use std::path::Path;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::KeywardError;
use crate::types::KeyringData;

/// An unlocked keyring: decrypted contents plus the means to write them back.
#[async_trait]
pub trait KeyringContainer: Send + Sync {
    /// The decrypted namespaces.
    fn data(&self) -> &KeyringData;

    /// Mutable access to the decrypted namespaces. Changes stay in memory
    /// until [`sync`](Self::sync) succeeds.
    fn data_mut(&mut self) -> &mut KeyringData;

    /// Persist the current contents back to the encrypted container.
    ///
    /// Replacing the on-disk container must be atomic: after a failed sync the
    /// previous container is still intact.
    async fn sync(&self) -> Result<(), KeywardError>;
}

/// Opens and authenticates keyring containers.
#[async_trait]
pub trait KeyringOpener: Send + Sync {
    /// Decrypt the container at `path` with `password`.
    ///
    /// Wrong passwords, missing or corrupt containers, and I/O failures are
    /// all errors; callers treat every one of them as an authentication
    /// failure.
    async fn open(
        &self,
        path: &Path,
        password: &SecretString,
    ) -> Result<Box<dyn KeyringContainer>, KeywardError>;
}
