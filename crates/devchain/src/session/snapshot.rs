use tracing::{debug, warn};

use super::ChainSession;
use crate::{Result, SnapshotError};

impl ChainSession {
    /// Takes a node snapshot and records the session's local state under its id.
    pub async fn snapshot(&mut self) -> Result<String> {
        let id = self.interface.snapshot().await?;
        self.snapshots.insert(id.clone(), self.state.clone());
        debug!(session = self.id(), snapshot = %id, "Snapshot taken");
        Ok(id)
    }

    /// Reverts the node and the local state to snapshot `id`, consuming it.
    ///
    /// Unknown ids fail without contacting the node. If the node refuses the revert the local
    /// state is left as it is.
    pub async fn revert(&mut self, id: &str) -> Result<()> {
        if !self.snapshots.contains_key(id) {
            return Err(SnapshotError::Unknown(id.to_string()).into());
        }
        if !self.interface.revert(id).await? {
            warn!(session = self.id(), snapshot = %id, "Node refused to revert");
            return Err(SnapshotError::RevertFailed(id.to_string()).into());
        }
        if let Some(state) = self.snapshots.remove(id) {
            self.state = state;
        }
        debug!(session = self.id(), snapshot = %id, "Reverted");
        Ok(())
    }

    /// Ids of the snapshots that can still be reverted to.
    pub fn snapshot_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.snapshots.keys().map(String::as_str)
    }
}
