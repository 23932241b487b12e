//! In-memory store adapters backed by DashMap.
//!
//! Used in tests and by hosts that embed the subsystem without a persistent
//! backend. All data is lost on process exit.

use std::sync::RwLock;

use dashmap::DashMap;

use crate::content::ContentItem;
use crate::graph::snapshot::GraphSnapshot;
use crate::relationship::{RelationKind, Relationship};

use super::{ContentStore, RelationshipStore, SnapshotStore, StoreResult};

// ---------------------------------------------------------------------------
// Content store
// ---------------------------------------------------------------------------

/// Concurrent in-memory content store.
///
/// `list` orders by `(created_at, id)` — creation order with a deterministic
/// tie-break. This is the documented listing order used for rebuild
/// truncation and inference candidate pools.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    items: DashMap<String, ContentItem>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn put(&self, item: ContentItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// Remove an item. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.items.remove(id).is_some()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, id: &str) -> StoreResult<Option<ContentItem>> {
        Ok(self.items.get(id).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> StoreResult<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> =
            self.items.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Relationship store
// ---------------------------------------------------------------------------

/// Concurrent in-memory relationship store.
///
/// The `list_by_*` index queries scan the map; listings are id-sorted so
/// results are deterministic.
#[derive(Debug, Default)]
pub struct MemoryRelationshipStore {
    relationships: DashMap<String, Relationship>,
}

impl MemoryRelationshipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    fn list_where(&self, predicate: impl Fn(&Relationship) -> bool) -> Vec<Relationship> {
        let mut records: Vec<Relationship> = self
            .relationships
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }
}

impl RelationshipStore for MemoryRelationshipStore {
    fn create(&self, relationship: &Relationship) -> StoreResult<()> {
        self.relationships
            .insert(relationship.id.clone(), relationship.clone());
        Ok(())
    }

    fn read(&self, id: &str) -> StoreResult<Option<Relationship>> {
        Ok(self.relationships.get(id).map(|entry| entry.value().clone()))
    }

    fn update(&self, relationship: &Relationship) -> StoreResult<()> {
        self.relationships
            .insert(relationship.id.clone(), relationship.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.relationships.remove(id).is_some())
    }

    fn list_by_source(&self, source_id: &str) -> StoreResult<Vec<Relationship>> {
        Ok(self.list_where(|r| r.source_id == source_id))
    }

    fn list_by_target(&self, target_id: &str) -> StoreResult<Vec<Relationship>> {
        Ok(self.list_where(|r| r.target_id == target_id))
    }

    fn list_by_kind(&self, kind: RelationKind) -> StoreResult<Vec<Relationship>> {
        Ok(self.list_where(|r| r.kind == kind))
    }

    fn list_all(&self) -> StoreResult<Vec<Relationship>> {
        Ok(self.list_where(|_| true))
    }

    fn bulk_create(&self, relationships: &[Relationship]) -> StoreResult<usize> {
        for relationship in relationships {
            self.relationships
                .insert(relationship.id.clone(), relationship.clone());
        }
        Ok(relationships.len())
    }

    fn clear(&self) -> StoreResult<()> {
        self.relationships.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot store
// ---------------------------------------------------------------------------

/// In-memory snapshot slot.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: RwLock<Option<GraphSnapshot>>,
}

impl MemorySnapshotStore {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> StoreResult<Option<GraphSnapshot>> {
        Ok(self.slot.read().expect("snapshot lock poisoned").clone())
    }

    fn save(&self, snapshot: &GraphSnapshot) -> StoreResult<()> {
        *self.slot.write().expect("snapshot lock poisoned") = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::engine::{GraphConfig, KnowledgeGraphEngine};

    #[test]
    fn content_put_read_list() {
        let store = MemoryContentStore::new();
        store.put(ContentItem::new("b", "B").with_created_at(200));
        store.put(ContentItem::new("a", "A").with_created_at(100));

        assert_eq!(store.read("a").unwrap().unwrap().title, "A");
        assert!(store.read("ghost").unwrap().is_none());

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        // Creation order, not insertion order.
        assert_eq!(listed[0].id, "a");
    }

    #[test]
    fn content_list_ties_break_by_id() {
        let store = MemoryContentStore::new();
        store.put(ContentItem::new("z", "Z").with_created_at(100));
        store.put(ContentItem::new("a", "A").with_created_at(100));
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "z"]);
    }

    #[test]
    fn relationship_crud() {
        let store = MemoryRelationshipStore::new();
        let rel = Relationship::new("a", "b", RelationKind::Similar, 0.8, 0.7);
        store.create(&rel).unwrap();

        assert_eq!(store.read(&rel.id).unwrap().unwrap().source_id, "a");
        assert!(store.delete(&rel.id).unwrap());
        assert!(!store.delete(&rel.id).unwrap());
        assert!(store.read(&rel.id).unwrap().is_none());
    }

    #[test]
    fn relationship_index_listings() {
        let store = MemoryRelationshipStore::new();
        store
            .create(&Relationship::new("a", "b", RelationKind::Similar, 0.8, 0.7))
            .unwrap();
        store
            .create(&Relationship::new("a", "c", RelationKind::Related, 0.5, 0.4))
            .unwrap();
        store
            .create(&Relationship::new("c", "b", RelationKind::Similar, 0.6, 0.5))
            .unwrap();

        assert_eq!(store.list_by_source("a").unwrap().len(), 2);
        assert_eq!(store.list_by_target("b").unwrap().len(), 2);
        assert_eq!(store.list_by_kind(RelationKind::Similar).unwrap().len(), 2);
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    #[test]
    fn bulk_create_and_clear() {
        let store = MemoryRelationshipStore::new();
        let batch = vec![
            Relationship::new("a", "b", RelationKind::Similar, 0.8, 0.7),
            Relationship::new("b", "a", RelationKind::Similar, 0.8, 0.7),
        ];
        assert_eq!(store.bulk_create(&batch).unwrap(), 2);
        assert_eq!(store.len(), 2);
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_slot_round_trip() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());

        let mut kg = KnowledgeGraphEngine::new(GraphConfig::default());
        kg.add_content(&ContentItem::new("a", "A"));
        let snapshot = kg.export_snapshot();
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.nodes.len(), 1);
    }
}
