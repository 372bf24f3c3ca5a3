// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted password prompt.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use keyward_core::PasswordPrompt;
use secrecy::SecretString;
use tokio::sync::{Mutex, Notify, watch};

/// A prompt that replays scripted answers.
///
/// Each `collect()` pops the next answer; `None` entries (and an exhausted
/// script) behave like the user pressing cancel. A gated prompt blocks every
/// `collect()` until [`release`](Self::release) is called, which lets tests
/// hold an unlock attempt in flight.
#[derive(Clone)]
pub struct ScriptedPrompt {
    answers: Arc<Mutex<VecDeque<Option<String>>>>,
    calls: Arc<AtomicUsize>,
    started: Arc<Notify>,
    gate: Arc<watch::Sender<bool>>,
}

impl ScriptedPrompt {
    /// A prompt that answers immediately.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let prompt = Self::gated(answers);
        prompt.release();
        prompt
    }

    /// A prompt whose answers are withheld until [`release`](Self::release).
    pub fn gated<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let (gate, _) = watch::channel(false);
        Self {
            answers: Arc::new(Mutex::new(
                answers.into_iter().map(|a| a.map(Into::into)).collect(),
            )),
            calls: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(Notify::new()),
            gate: Arc::new(gate),
        }
    }

    /// Always answers `password`.
    pub fn always(password: &str) -> Self {
        Self::new(std::iter::repeat_n(Some(password.to_string()), 64))
    }

    /// Always cancels.
    pub fn cancelling() -> Self {
        Self::new(std::iter::empty::<Option<String>>())
    }

    /// Let pending and future `collect()` calls answer.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Number of times `collect()` has been entered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until some `collect()` call has started.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Append another answer to the script.
    pub async fn push_answer(&self, answer: Option<&str>) {
        self.answers
            .lock()
            .await
            .push_back(answer.map(str::to_string));
    }
}

#[async_trait]
impl PasswordPrompt for ScriptedPrompt {
    async fn collect(&self) -> Option<SecretString> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();

        let mut gate = self.gate.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = gate.wait_for(|open| *open).await;

        self.answers
            .lock()
            .await
            .pop_front()
            .flatten()
            .map(SecretString::from)
    }
}
