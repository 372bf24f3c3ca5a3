// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unlock gate.
//!
//! A [`KeyringSession`] holds at most one decrypted keyring for the lifetime
//! of the process. The first request that needs it becomes the single issuer
//! of an unlock attempt (prompt, then decrypt); every request arriving while
//! that attempt is in flight waits for the same outcome.
//!
//! ```text
//! Locked --acquire--> Unlocking --success--> Unlocked (terminal)
//!    ^                    |
//!    +---cancel/failure---+
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyward_core::{
    Credential, ErrorNotifier, KeyMaterial, KeyringContainer, KeyringData, KeyringOpener,
    KeywardError, PasswordPrompt,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, watch};
use tracing::{debug, info, warn};

/// Message shown to the user when a supplied password does not open the
/// keyring.
pub const UNLOCK_FAILURE_MESSAGE: &str = "Unable to access or decrypt keyring.";

/// Shared handle to the unlocked keyring.
pub type KeyringHandle = Arc<RwLock<Box<dyn KeyringContainer>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockReason {
    PromptCancelled,
    AuthFailure,
    Aborted,
}

impl From<LockReason> for KeywardError {
    fn from(reason: LockReason) -> Self {
        match reason {
            LockReason::PromptCancelled => KeywardError::PromptCancelled,
            LockReason::AuthFailure => KeywardError::AuthFailure(UNLOCK_FAILURE_MESSAGE.to_string()),
            LockReason::Aborted => {
                KeywardError::AuthFailure("unlock attempt ended without a result".to_string())
            }
        }
    }
}

type UnlockOutcome = Result<KeyringHandle, LockReason>;

enum UnlockState {
    Locked,
    Unlocking(watch::Receiver<Option<UnlockOutcome>>),
    Unlocked(KeyringHandle),
}

/// Puts the state back to `Locked` if the unlock task is dropped before it
/// records an outcome.
struct ResetOnDrop<'a> {
    state: Option<&'a Mutex<UnlockState>>,
}

impl ResetOnDrop<'_> {
    fn disarm(&mut self) {
        self.state = None;
    }
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            warn!("unlock attempt aborted, keyring stays locked");
            *state.lock().unwrap_or_else(PoisonError::into_inner) = UnlockState::Locked;
        }
    }
}

/// A single in-memory change, applied under the write lock.
enum Write {
    Credential(String, Credential),
    Key(String, KeyMaterial),
}

/// What it takes to undo a [`Write`].
enum Undo {
    Credential(String, Option<Credential>),
    Key(String, Option<KeyMaterial>),
}

impl Write {
    fn apply(self, data: &mut KeyringData) -> Undo {
        match self {
            Write::Credential(id, credential) => {
                let previous = data.set_credential(&id, credential);
                Undo::Credential(id, previous)
            }
            Write::Key(id, key) => {
                let previous = data.set_key(&id, key);
                Undo::Key(id, previous)
            }
        }
    }
}

impl Undo {
    fn revert(self, data: &mut KeyringData) {
        match self {
            Undo::Credential(id, previous) => data.restore_credential(&id, previous),
            Undo::Key(id, previous) => data.restore_key(&id, previous),
        }
    }
}

/// An applied change still holding the write lock. Dropped without
/// [`commit`](Self::commit), including by a panic inside `sync`, it reverts
/// the change before the lock is released.
struct PendingWrite {
    keyring: OwnedRwLockWriteGuard<Box<dyn KeyringContainer>>,
    undo: Option<Undo>,
}

impl PendingWrite {
    fn apply(mut keyring: OwnedRwLockWriteGuard<Box<dyn KeyringContainer>>, write: Write) -> Self {
        let undo = write.apply(keyring.data_mut());
        Self {
            keyring,
            undo: Some(undo),
        }
    }

    fn commit(mut self) {
        self.undo = None;
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo.revert(self.keyring.data_mut());
        }
    }
}

/// Owner of the process-wide keyring.
pub struct KeyringSession {
    path: PathBuf,
    opener: Arc<dyn KeyringOpener>,
    prompt: Arc<dyn PasswordPrompt>,
    notifier: Arc<dyn ErrorNotifier>,
    state: Mutex<UnlockState>,
}

impl KeyringSession {
    pub fn new(
        path: impl Into<PathBuf>,
        opener: Arc<dyn KeyringOpener>,
        prompt: Arc<dyn PasswordPrompt>,
        notifier: Arc<dyn ErrorNotifier>,
    ) -> Self {
        Self {
            path: path.into(),
            opener,
            prompt,
            notifier,
            state: Mutex::new(UnlockState::Locked),
        }
    }

    /// Container every connection of this process targets.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(*self.lock_state(), UnlockState::Unlocked(_))
    }

    fn lock_state(&self) -> MutexGuard<'_, UnlockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the unlocked keyring, unlocking it first if needed.
    ///
    /// At most one unlock attempt runs at a time. The attempt runs in its own
    /// task, so it finishes even if every caller waiting on it goes away.
    /// Errors are [`KeywardError::PromptCancelled`] or
    /// [`KeywardError::AuthFailure`]; either way the keyring stays locked and
    /// a later call may prompt again.
    pub async fn acquire(self: &Arc<Self>) -> Result<KeyringHandle, KeywardError> {
        let mut outcome = {
            let mut state = self.lock_state();
            match &*state {
                UnlockState::Unlocked(handle) => return Ok(Arc::clone(handle)),
                UnlockState::Unlocking(outcome) => {
                    debug!("joining unlock attempt in flight");
                    outcome.clone()
                }
                UnlockState::Locked => {
                    let (tx, rx) = watch::channel(None);
                    *state = UnlockState::Unlocking(rx.clone());
                    let session = Arc::clone(self);
                    tokio::spawn(async move { session.run_unlock(tx).await });
                    rx
                }
            }
        };

        match outcome.wait_for(Option::is_some).await {
            Ok(result) => match &*result {
                Some(Ok(handle)) => Ok(Arc::clone(handle)),
                Some(Err(reason)) => Err((*reason).into()),
                None => Err(LockReason::Aborted.into()),
            },
            // The unlock task went away without reporting.
            Err(_) => Err(LockReason::Aborted.into()),
        }
    }

    async fn run_unlock(self: Arc<Self>, tx: watch::Sender<Option<UnlockOutcome>>) {
        let mut reset = ResetOnDrop {
            state: Some(&self.state),
        };
        let outcome = self.attempt_unlock().await;

        *self.lock_state() = match &outcome {
            Ok(handle) => UnlockState::Unlocked(Arc::clone(handle)),
            Err(_) => UnlockState::Locked,
        };
        reset.disarm();
        tx.send_replace(Some(outcome));
    }

    async fn attempt_unlock(&self) -> UnlockOutcome {
        let Some(password) = self.prompt.collect().await else {
            info!("password prompt cancelled, keyring stays locked");
            return Err(LockReason::PromptCancelled);
        };

        match self.opener.open(&self.path, &password).await {
            Ok(container) => {
                info!(path = %self.path.display(), "keyring unlocked");
                Ok(Arc::new(RwLock::new(container)))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to open keyring");
                self.notifier.show_error(UNLOCK_FAILURE_MESSAGE);
                Err(LockReason::AuthFailure)
            }
        }
    }

    pub async fn get_credential(
        self: &Arc<Self>,
        id: &str,
    ) -> Result<Option<Credential>, KeywardError> {
        let handle = self.acquire().await?;
        let keyring = handle.read().await;
        Ok(keyring.data().credential(id).cloned())
    }

    pub async fn get_key(self: &Arc<Self>, id: &str) -> Result<Option<KeyMaterial>, KeywardError> {
        let handle = self.acquire().await?;
        let keyring = handle.read().await;
        Ok(keyring.data().key(id).cloned())
    }

    /// Insert or overwrite a credential and persist the keyring.
    pub async fn add_credential(
        self: &Arc<Self>,
        id: String,
        credential: Credential,
    ) -> Result<(), KeywardError> {
        self.write(Write::Credential(id, credential)).await
    }

    /// Insert or overwrite a key and persist the keyring.
    pub async fn add_key(self: &Arc<Self>, id: String, key: KeyMaterial) -> Result<(), KeywardError> {
        self.write(Write::Key(id, key)).await
    }

    /// Apply `write` and sync under the write lock. A failed or panicking
    /// sync reverts the in-memory change. The work runs in its own task so a
    /// caller that goes away cannot interrupt it between mutation and persist.
    async fn write(self: &Arc<Self>, write: Write) -> Result<(), KeywardError> {
        let handle = self.acquire().await?;
        let task = tokio::spawn(async move {
            let pending = PendingWrite::apply(handle.write_owned().await, write);
            let synced = pending.keyring.sync().await;
            match synced {
                Ok(()) => {
                    pending.commit();
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "keyring sync failed, change rolled back");
                    Err(e)
                }
            }
        });
        task.await
            .map_err(|e| KeywardError::Internal(format!("keyring write task failed: {e}")))?
    }
}
