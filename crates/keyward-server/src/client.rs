// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client side of the socket protocol.

use std::path::Path;

use keyward_core::{Credential, KeyMaterial, KeywardError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use zeroize::Zeroizing;

use crate::protocol::{Lookup, Request, Response};

/// A connection to a running broker.
pub struct KeyClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl KeyClient {
    pub async fn connect(socket_path: &Path) -> Result<Self, KeywardError> {
        let stream = UnixStream::connect(socket_path).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one request and wait for its response.
    pub async fn request(&mut self, request: &Request) -> Result<Response, KeywardError> {
        let mut frame = Zeroizing::new(
            serde_json::to_string(request)
                .map_err(|e| KeywardError::Protocol(format!("failed to encode request: {e}")))?,
        );
        frame.push('\n');
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;

        let line = self.lines.next_line().await?.ok_or_else(|| {
            KeywardError::Protocol("connection closed before a response arrived".to_string())
        })?;
        let line = Zeroizing::new(line);
        serde_json::from_str(&line)
            .map_err(|e| KeywardError::Protocol(format!("malformed response: {e}")))
    }

    pub async fn greet(&mut self) -> Result<(), KeywardError> {
        match self.request(&Request::Greet).await? {
            Response::Greet => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Returns the broker's success flag.
    pub async fn add_username_password(
        &mut self,
        id: &str,
        username: &str,
        password: &str,
    ) -> Result<bool, KeywardError> {
        let request = Request::AddUsernamePassword {
            id: id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.request(&request).await? {
            Response::AddUsernamePassword { success } => Ok(success),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_username_password(
        &mut self,
        id: &str,
    ) -> Result<Lookup<Credential>, KeywardError> {
        let request = Request::GetUsernamePassword { id: id.to_string() };
        match self.request(&request).await? {
            Response::GetUsernamePassword {
                found,
                has_value,
                username,
                password,
            } => Ok(match (found, has_value) {
                (false, _) => Lookup::Unavailable,
                (true, false) => Lookup::Missing,
                (true, true) => Lookup::Found(Credential::new(username, password)),
            }),
            other => Err(unexpected(&other)),
        }
    }

    /// Returns the broker's success flag.
    pub async fn add_key(&mut self, id: &str, key: &str) -> Result<bool, KeywardError> {
        let request = Request::AddKey {
            id: id.to_string(),
            key: key.to_string(),
        };
        match self.request(&request).await? {
            Response::AddKey { success } => Ok(success),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn get_key(&mut self, id: &str) -> Result<Lookup<KeyMaterial>, KeywardError> {
        let request = Request::GetKey { id: id.to_string() };
        match self.request(&request).await? {
            Response::GetKey {
                found,
                has_value,
                key,
            } => Ok(match (found, has_value) {
                (false, _) => Lookup::Unavailable,
                (true, false) => Lookup::Missing,
                (true, true) => Lookup::Found(KeyMaterial::new(key)),
            }),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &Response) -> KeywardError {
    match response {
        Response::Error { message } => KeywardError::Protocol(message.clone()),
        other => KeywardError::Protocol(format!("unexpected `{}` response", other.kind())),
    }
}
