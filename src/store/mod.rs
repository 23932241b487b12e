//! Storage collaborator boundary.
//!
//! The content store, relationship record store, and snapshot sink are
//! external collaborators; this module defines the trait contracts the engine
//! consumes and ships two adapter families:
//!
//! - [`mem`] — in-memory adapters (DashMap) for tests and embedding
//! - [`durable`] — ACID adapters backed by redb
//!
//! Adapters report failure as [`StoreError`] values; nothing panics across
//! the trait boundary.

pub mod durable;
pub mod mem;

use crate::content::ContentItem;
use crate::error::StoreError;
use crate::graph::snapshot::GraphSnapshot;
use crate::relationship::{RelationKind, Relationship};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only access to saved content items.
pub trait ContentStore: Send + Sync {
    /// Read one item. `Ok(None)` when the id is unknown.
    fn read(&self, id: &str) -> StoreResult<Option<ContentItem>>;

    /// List all items in the store's documented listing order.
    fn list(&self) -> StoreResult<Vec<ContentItem>>;
}

/// Keyed storage for relationship records.
pub trait RelationshipStore: Send + Sync {
    /// Create or replace a record.
    fn create(&self, relationship: &Relationship) -> StoreResult<()>;

    /// Read one record. `Ok(None)` when the id is unknown.
    fn read(&self, id: &str) -> StoreResult<Option<Relationship>>;

    /// Update an existing record.
    fn update(&self, relationship: &Relationship) -> StoreResult<()>;

    /// Delete a record. Returns whether it existed.
    fn delete(&self, id: &str) -> StoreResult<bool>;

    /// All records with the given source id.
    fn list_by_source(&self, source_id: &str) -> StoreResult<Vec<Relationship>>;

    /// All records with the given target id.
    fn list_by_target(&self, target_id: &str) -> StoreResult<Vec<Relationship>>;

    /// All records of the given kind.
    fn list_by_kind(&self, kind: RelationKind) -> StoreResult<Vec<Relationship>>;

    /// All records.
    fn list_all(&self) -> StoreResult<Vec<Relationship>>;

    /// Create or replace a batch. Returns the number written.
    fn bulk_create(&self, relationships: &[Relationship]) -> StoreResult<usize>;

    /// Remove every record.
    fn clear(&self) -> StoreResult<()>;
}

/// Single-key sink for graph snapshots, overwritten wholesale on save.
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, if any.
    fn load(&self) -> StoreResult<Option<GraphSnapshot>>;

    /// Overwrite the stored snapshot.
    fn save(&self, snapshot: &GraphSnapshot) -> StoreResult<()>;
}
