//! Persistence for the server's configured node ID.
//!
//! Mirrors `lockframe-server::storage::Storage`'s trait-over-backend split:
//! a synchronous trait implemented by an in-memory backend for tests and a
//! Redb-backed one for production, both storing a single value under a
//! fixed key.

use std::sync::{Arc, Mutex};

use redb::{Database, TableDefinition};

use crate::error::{NodeIdStoreError, Result};

const NODE_ID_KEY: &str = "node_id";
const NODE_ID_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("node_id");

/// Persists the server's node ID across restarts.
pub trait NodeIdStore: Send + Sync {
    /// The persisted ID, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<u8>>;

    /// Overwrite the persisted ID.
    fn store(&self, id: u8) -> Result<()>;
}

/// In-memory [`NodeIdStore`] for tests; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryNodeIdStore {
    id: Arc<Mutex<Option<u8>>>,
}

impl MemoryNodeIdStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeIdStore for MemoryNodeIdStore {
    fn load(&self) -> Result<Option<u8>> {
        Ok(*self.id.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    fn store(&self, id: u8) -> Result<()> {
        *self.id.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(id);
        Ok(())
    }
}

/// Durable [`NodeIdStore`] backed by Redb.
///
/// Thread-safe through Redb's internal locking; cheap to clone (`Arc`).
#[derive(Clone)]
pub struct RedbNodeIdStore {
    db: Arc<Database>,
}

impl RedbNodeIdStore {
    /// Open or create a Redb database at `path`, creating the node-ID table
    /// if it doesn't exist.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = Database::create(path.as_ref())
            .map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        {
            let _ = txn
                .open_table(NODE_ID_TABLE)
                .map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        }
        txn.commit().map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl NodeIdStore for RedbNodeIdStore {
    fn load(&self) -> Result<Option<u8>> {
        let txn = self.db.begin_read().map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        let table =
            txn.open_table(NODE_ID_TABLE).map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;

        match table.get(NODE_ID_KEY).map_err(|e| NodeIdStoreError::Backend(e.to_string()))? {
            Some(value) => {
                let bytes = value.value();
                Ok(bytes.first().copied())
            }
            None => Ok(None),
        }
    }

    fn store(&self, id: u8) -> Result<()> {
        let txn = self.db.begin_write().map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        {
            let mut table = txn
                .open_table(NODE_ID_TABLE)
                .map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
            table
                .insert(NODE_ID_KEY, [id].as_slice())
                .map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        }
        txn.commit().map_err(|e| NodeIdStoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryNodeIdStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.store(7).unwrap();
        assert_eq!(store.load().unwrap(), Some(7));
    }

    #[test]
    fn redb_store_round_trips() {
        let dir = tempdir().unwrap();
        let store = RedbNodeIdStore::open(dir.path().join("node_id.redb")).unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.store(42).unwrap();
        assert_eq!(store.load().unwrap(), Some(42));
    }

    #[test]
    fn redb_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("node_id.redb");
        {
            let store = RedbNodeIdStore::open(&path).unwrap();
            store.store(9).unwrap();
        }
        let reopened = RedbNodeIdStore::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(9));
    }
}
