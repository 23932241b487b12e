//! ACID-durable store adapters backed by redb.
//!
//! One [`DurableStore`] serves as both the relationship record store and the
//! snapshot sink. Relationship records are bincode-encoded; the snapshot blob
//! is JSON so it stays human-inspectable. All writes go through transactions;
//! reads use MVCC snapshots.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::graph::snapshot::GraphSnapshot;
use crate::relationship::{RelationKind, Relationship};

use super::{RelationshipStore, SnapshotStore, StoreResult};

/// Relationship records: relationship id → bincode-encoded record.
const RELATIONSHIPS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("relationships");

/// Snapshot sink: single key → JSON-encoded snapshot.
const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");

const SNAPSHOT_KEY: &str = "graph";

/// ACID-durable store using redb.
pub struct DurableStore {
    db: Arc<Database>,
}

impl DurableStore {
    /// Open or create a durable store in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join("recollect.redb");
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Create both tables up front so reads before the first write succeed.
        let txn = db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            txn.open_table(RELATIONSHIPS_TABLE)
                .map_err(|e| StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                })?;
            txn.open_table(SNAPSHOT_TABLE).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put_record(&self, relationship: &Relationship) -> StoreResult<()> {
        let encoded = bincode::serialize(relationship).map_err(|e| StoreError::Serialization {
            message: format!("failed to serialize relationship: {e}"),
        })?;
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn
                .open_table(RELATIONSHIPS_TABLE)
                .map_err(|e| StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                })?;
            table
                .insert(relationship.id.as_str(), encoded.as_slice())
                .map_err(|e| StoreError::Redb {
                    message: format!("insert failed: {e}"),
                })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }

    /// Scan the relationship table, keeping records matching `predicate`.
    ///
    /// Records are small and the table is key-sorted, so listings come back
    /// in id order without a secondary index.
    fn scan(&self, predicate: impl Fn(&Relationship) -> bool) -> StoreResult<Vec<Relationship>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = txn
            .open_table(RELATIONSHIPS_TABLE)
            .map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        let mut records = Vec::new();
        let iter = table.iter().map_err(|e| StoreError::Redb {
            message: format!("iter failed: {e}"),
        })?;
        for entry in iter {
            let (_, value) = entry.map_err(|e| StoreError::Redb {
                message: format!("iter entry failed: {e}"),
            })?;
            let record: Relationship =
                bincode::deserialize(value.value()).map_err(|e| StoreError::Serialization {
                    message: format!("failed to deserialize relationship: {e}"),
                })?;
            if predicate(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl RelationshipStore for DurableStore {
    fn create(&self, relationship: &Relationship) -> StoreResult<()> {
        self.put_record(relationship)
    }

    fn read(&self, id: &str) -> StoreResult<Option<Relationship>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = txn
            .open_table(RELATIONSHIPS_TABLE)
            .map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        let result = table.get(id).map_err(|e| StoreError::Redb {
            message: format!("get failed: {e}"),
        })?;
        match result {
            Some(guard) => {
                let record = bincode::deserialize(guard.value()).map_err(|e| {
                    StoreError::Serialization {
                        message: format!("failed to deserialize relationship: {e}"),
                    }
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn update(&self, relationship: &Relationship) -> StoreResult<()> {
        self.put_record(relationship)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        let existed = {
            let mut table = txn
                .open_table(RELATIONSHIPS_TABLE)
                .map_err(|e| StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                })?;
            let removed = table.remove(id).map_err(|e| StoreError::Redb {
                message: format!("remove failed: {e}"),
            })?;
            removed.is_some()
        };
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(existed)
    }

    fn list_by_source(&self, source_id: &str) -> StoreResult<Vec<Relationship>> {
        self.scan(|r| r.source_id == source_id)
    }

    fn list_by_target(&self, target_id: &str) -> StoreResult<Vec<Relationship>> {
        self.scan(|r| r.target_id == target_id)
    }

    fn list_by_kind(&self, kind: RelationKind) -> StoreResult<Vec<Relationship>> {
        self.scan(|r| r.kind == kind)
    }

    fn list_all(&self) -> StoreResult<Vec<Relationship>> {
        self.scan(|_| true)
    }

    fn bulk_create(&self, relationships: &[Relationship]) -> StoreResult<usize> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn
                .open_table(RELATIONSHIPS_TABLE)
                .map_err(|e| StoreError::Redb {
                    message: format!("open_table failed: {e}"),
                })?;
            for relationship in relationships {
                let encoded =
                    bincode::serialize(relationship).map_err(|e| StoreError::Serialization {
                        message: format!("failed to serialize relationship: {e}"),
                    })?;
                table
                    .insert(relationship.id.as_str(), encoded.as_slice())
                    .map_err(|e| StoreError::Redb {
                        message: format!("insert failed: {e}"),
                    })?;
            }
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(relationships.len())
    }

    fn clear(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        txn.delete_table(RELATIONSHIPS_TABLE)
            .map_err(|e| StoreError::Redb {
                message: format!("delete_table failed: {e}"),
            })?;
        txn.open_table(RELATIONSHIPS_TABLE)
            .map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }
}

impl SnapshotStore for DurableStore {
    fn load(&self) -> StoreResult<Option<GraphSnapshot>> {
        let txn = self.db.begin_read().map_err(|e| StoreError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;
        let table = txn.open_table(SNAPSHOT_TABLE).map_err(|e| StoreError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        let result = table.get(SNAPSHOT_KEY).map_err(|e| StoreError::Redb {
            message: format!("get failed: {e}"),
        })?;
        match result {
            Some(guard) => {
                let snapshot = serde_json::from_slice(guard.value()).map_err(|e| {
                    StoreError::Serialization {
                        message: format!("failed to deserialize snapshot: {e}"),
                    }
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &GraphSnapshot) -> StoreResult<()> {
        let encoded = serde_json::to_vec(snapshot).map_err(|e| StoreError::Serialization {
            message: format!("failed to serialize snapshot: {e}"),
        })?;
        let txn = self.db.begin_write().map_err(|e| StoreError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn.open_table(SNAPSHOT_TABLE).map_err(|e| StoreError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            table
                .insert(SNAPSHOT_KEY, encoded.as_slice())
                .map_err(|e| StoreError::Redb {
                    message: format!("insert failed: {e}"),
                })?;
        }
        txn.commit().map_err(|e| StoreError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}
