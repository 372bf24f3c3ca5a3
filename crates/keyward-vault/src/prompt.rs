// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password collection.
//!
//! [`TerminalPrompt`] reads `KEYWARD_KEYRING_PASSWORD` or the controlling
//! terminal; [`AskpassPrompt`] runs an askpass-style program. Both report a
//! declined or empty answer as `None`.

use std::io::IsTerminal;
use std::process::Stdio;

use async_trait::async_trait;
use keyward_config::model::PromptConfig;
use keyward_core::{KeywardError, PasswordPrompt};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Environment variable that supplies the master password non-interactively.
pub const KEYRING_PASSWORD_ENV_VAR: &str = "KEYWARD_KEYRING_PASSWORD";

/// Text shown to the user when the keyring needs unlocking.
pub const PROMPT_TEXT: &str = "Enter your keyring password";

fn password_from_env() -> Option<SecretString> {
    std::env::var(KEYRING_PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_hidden(label: &str) -> Result<Zeroizing<String>, KeywardError> {
    rpassword::prompt_password(format!("{label}: "))
        .map(Zeroizing::new)
        .map_err(|e| KeywardError::Internal(format!("failed to read password: {e}")))
}

/// Prompt on the daemon's terminal, or take the password from the
/// environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl PasswordPrompt for TerminalPrompt {
    async fn collect(&self) -> Option<SecretString> {
        if let Some(password) = password_from_env() {
            debug!("master password taken from {KEYRING_PASSWORD_ENV_VAR}");
            return Some(password);
        }
        if !std::io::stdin().is_terminal() {
            warn!("no terminal available for the password prompt");
            return None;
        }

        let read = tokio::task::spawn_blocking(|| read_hidden(PROMPT_TEXT)).await;
        match read {
            Ok(Ok(password)) if !password.is_empty() => {
                Some(SecretString::from(password.as_str().to_owned()))
            }
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "terminal prompt failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "terminal prompt task failed");
                None
            }
        }
    }
}

/// Run an askpass-style program and take the first line it prints.
///
/// The prompt text is passed as the last argument, after any configured
/// arguments. A non-zero exit, an empty line or a failure to launch counts
/// as cancellation.
#[derive(Debug, Clone)]
pub struct AskpassPrompt {
    program: String,
    args: Vec<String>,
}

impl AskpassPrompt {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    async fn run(&self) -> Result<Option<SecretString>, KeywardError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(PROMPT_TEXT)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KeywardError::Internal("askpass stdout not captured".to_string()))?;
        let mut line = Zeroizing::new(String::new());
        {
            // Close our end before waiting so trailing output cannot block the child.
            let mut reader = BufReader::new(stdout);
            reader.read_line(&mut line).await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            debug!(program = %self.program, %status, "askpass declined");
            return Ok(None);
        }

        let password = line.trim_end_matches(['\r', '\n']);
        if password.is_empty() {
            return Ok(None);
        }
        Ok(Some(SecretString::from(password.to_owned())))
    }
}

#[async_trait]
impl PasswordPrompt for AskpassPrompt {
    async fn collect(&self) -> Option<SecretString> {
        match self.run().await {
            Ok(password) => password,
            Err(e) => {
                warn!(program = %self.program, error = %e, "askpass failed");
                None
            }
        }
    }
}

/// Build the prompt selected by `[prompt]` configuration.
pub fn prompt_from_config(config: &PromptConfig) -> Box<dyn PasswordPrompt> {
    match &config.command {
        Some(command) => Box::new(AskpassPrompt::new(command.clone(), config.args.clone())),
        None => Box::new(TerminalPrompt),
    }
}

/// Choose a master password for a new keyring.
///
/// Reads the environment variable, or asks twice on the terminal and checks
/// that both answers match.
pub fn read_new_password_with_confirm() -> Result<SecretString, KeywardError> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(KeywardError::Config(format!(
            "no password provided; set {KEYRING_PASSWORD_ENV_VAR} or run interactively"
        )));
    }

    let first = read_hidden("New keyring password")?;
    let second = read_hidden("Confirm keyring password")?;
    if first != second {
        return Err(KeywardError::Config("passwords do not match".to_string()));
    }
    if first.is_empty() {
        return Err(KeywardError::Config("empty password not allowed".to_string()));
    }
    Ok(SecretString::from(first.as_str().to_owned()))
}
