// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection bookkeeping for the socket server.
//!
//! The listener registers a handler when a client attaches and removes it
//! when the client goes away.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use keyward_core::ConnectionId;

use crate::handler::ConnectionHandler;
use crate::session::KeyringSession;

/// Live connections keyed by id.
///
/// Ids come from a monotonically increasing counter and are never reused.
/// Bookkeeping only: nothing here touches the keyring.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<ConnectionHandler>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a handler for a new connection and record it.
    pub fn register(&self, session: Arc<KeyringSession>) -> Arc<ConnectionHandler> {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler = Arc::new(ConnectionHandler::new(id, session));
        self.connections.insert(id, Arc::clone(&handler));
        handler
    }

    /// Forget a connection. Returns `false` if it was already gone.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
