// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client subcommands talking to a running broker.
//!
//! Exit status: 0 on success, 2 when the entry does not exist, 3 when the
//! broker could not unlock the keyring (or refused the write).

use std::io::{BufRead, IsTerminal};

use keyward_config::model::KeywardConfig;
use keyward_core::KeywardError;
use keyward_server::{KeyClient, Lookup};
use zeroize::Zeroizing;

pub const EXIT_MISSING: i32 = 2;
pub const EXIT_UNAVAILABLE: i32 = 3;

async fn connect(config: &KeywardConfig) -> Result<KeyClient, KeywardError> {
    let socket = config.daemon.socket_path();
    KeyClient::connect(&socket).await.map_err(|e| {
        KeywardError::Protocol(format!(
            "cannot reach broker at {} ({e}); is `keyward serve` running?",
            socket.display()
        ))
    })
}

fn lookup_status<T>(lookup: &Lookup<T>, id: &str) -> i32 {
    match lookup {
        Lookup::Found(_) => 0,
        Lookup::Missing => {
            eprintln!("keyward: no entry for `{id}`");
            EXIT_MISSING
        }
        Lookup::Unavailable => {
            eprintln!("keyward: keyring unavailable");
            EXIT_UNAVAILABLE
        }
    }
}

fn write_status(success: bool) -> i32 {
    if success {
        0
    } else {
        eprintln!("keyward: keyring unavailable or could not be saved");
        EXIT_UNAVAILABLE
    }
}

/// Read a secret from the terminal without echo, or from the first line of
/// stdin when it is not a terminal.
async fn read_secret(label: &'static str) -> Result<Zeroizing<String>, KeywardError> {
    tokio::task::spawn_blocking(move || -> Result<Zeroizing<String>, KeywardError> {
        if std::io::stdin().is_terminal() {
            return rpassword::prompt_password(format!("{label}: "))
                .map(Zeroizing::new)
                .map_err(KeywardError::from);
        }
        let mut line = Zeroizing::new(String::new());
        std::io::stdin().lock().read_line(&mut line)?;
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(line)
    })
    .await
    .map_err(|e| KeywardError::Internal(format!("reading input failed: {e}")))?
}

pub async fn ping(config: &KeywardConfig) -> Result<i32, KeywardError> {
    let mut client = connect(config).await?;
    client.greet().await?;
    println!("keyward is running at {}", config.daemon.socket_path().display());
    Ok(0)
}

pub async fn get_password(config: &KeywardConfig, id: &str) -> Result<i32, KeywardError> {
    let mut client = connect(config).await?;
    let lookup = client.get_username_password(id).await?;
    let status = lookup_status(&lookup, id);
    if let Lookup::Found(credential) = lookup {
        println!("{}", credential.username);
        println!("{}", credential.password);
    }
    Ok(status)
}

pub async fn add_password(
    config: &KeywardConfig,
    id: &str,
    username: &str,
) -> Result<i32, KeywardError> {
    let password = read_secret("Password").await?;
    let mut client = connect(config).await?;
    let success = client.add_username_password(id, username, &password).await?;
    Ok(write_status(success))
}

pub async fn get_key(config: &KeywardConfig, id: &str) -> Result<i32, KeywardError> {
    let mut client = connect(config).await?;
    let lookup = client.get_key(id).await?;
    let status = lookup_status(&lookup, id);
    if let Lookup::Found(key) = lookup {
        println!("{}", key.expose());
    }
    Ok(status)
}

pub async fn add_key(config: &KeywardConfig, id: &str) -> Result<i32, KeywardError> {
    let key = read_secret("Key").await?;
    let mut client = connect(config).await?;
    let success = client.add_key(id, &key).await?;
    Ok(write_status(success))
}
