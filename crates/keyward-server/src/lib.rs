// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Keyward broker.
//!
//! A [`KeyringSession`] owns the single decrypted keyring and its unlock
//! sequence. Each client connection gets a [`ConnectionHandler`] that maps
//! protocol requests onto the session; the [`ConnectionRegistry`] tracks
//! live connections and [`KeyServer`] ties them to a Unix socket.

pub mod client;
pub mod handler;
pub mod listener;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod shutdown;

pub use client::KeyClient;
pub use handler::ConnectionHandler;
pub use listener::KeyServer;
pub use protocol::{Lookup, Request, Response};
pub use registry::ConnectionRegistry;
pub use session::{KeyringHandle, KeyringSession, UNLOCK_FAILURE_MESSAGE};
pub use shutdown::install_signal_handler;
