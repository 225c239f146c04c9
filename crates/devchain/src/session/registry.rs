use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use super::SessionMode;

/// A connected session as seen by [`SessionRegistry::list_connected_sessions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Registry-assigned id, unique for the registry's lifetime
    pub id: u64,
    /// Node URL
    pub uri: String,
    /// Chain id, known once the session has read it from the node
    pub chain_id: Option<u64>,
    /// Session mode
    pub mode: SessionMode,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    sessions: BTreeMap<u64, SessionInfo>,
}

/// Tracks every connected [`ChainSession`](super::ChainSession).
///
/// Cloning yields a handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all sessions that are currently connected, in connection order.
    pub fn list_connected_sessions(&self) -> Vec<SessionInfo> {
        self.lock().sessions.values().cloned().collect()
    }

    /// Whether no session is connected.
    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }

    pub(crate) fn register(&self, uri: &str, mode: SessionMode) -> Registration {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.sessions.insert(id, SessionInfo { id, uri: uri.to_string(), chain_id: None, mode });
        debug!(session = id, uri, "Session registered");
        Registration { registry: self.clone(), id }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one session in a [`SessionRegistry`]; dropping it deregisters the session.
#[derive(Debug)]
pub(crate) struct Registration {
    registry: SessionRegistry,
    id: u64,
}

impl Registration {
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn set_chain_id(&self, chain_id: u64) {
        if let Some(info) = self.registry.lock().sessions.get_mut(&self.id) {
            info.chain_id = Some(chain_id);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.lock().sessions.remove(&self.id);
        debug!(session = self.id, "Session deregistered");
    }
}
