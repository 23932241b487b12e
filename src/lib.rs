// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # recollect
//!
//! Relationship inference and knowledge graph engine for a personal
//! content-capture tool: infers semantic relationships between saved items
//! and maintains the graph backing related-content recommendation,
//! clustering, and visualization.
//!
//! ## Architecture
//!
//! - **Inference** (`infer`, `score`): pairwise relationship scoring with a
//!   pluggable scorer, capped and threshold-filtered
//! - **Coordination** (`coordinator`): per-id in-flight de-duplication,
//!   debounced batching, persistence, statistics
//! - **Knowledge graph** (`graph`): arena-owned nodes/edges/clusters with
//!   traversal, queries, clustering, force-directed layout, and snapshots
//! - **Lifecycle** (`lifecycle`): graph ownership, rebuild, and the periodic
//!   snapshot/layout schedules
//! - **Storage boundary** (`store`): collaborator traits with in-memory
//!   (DashMap) and durable (redb) adapters
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use recollect::content::ContentItem;
//! use recollect::coordinator::{CoordinatorConfig, RelationshipCoordinator};
//! use recollect::lifecycle::{GraphLifecycleManager, LifecycleConfig};
//! use recollect::store::mem::{MemoryContentStore, MemoryRelationshipStore, MemorySnapshotStore};
//!
//! let content = Arc::new(MemoryContentStore::new());
//! content.put(ContentItem::new("a", "Ownership in Rust").with_concepts(["rust"]));
//! content.put(ContentItem::new("b", "Borrowing explained").with_concepts(["rust"]));
//! let relationships = Arc::new(MemoryRelationshipStore::new());
//!
//! let coordinator = RelationshipCoordinator::new(
//!     Arc::clone(&content) as _,
//!     Arc::clone(&relationships) as _,
//!     CoordinatorConfig::default(),
//! );
//! coordinator.process_content("a").unwrap();
//!
//! let mut manager = GraphLifecycleManager::new(
//!     content,
//!     relationships,
//!     Arc::new(MemorySnapshotStore::new()),
//!     LifecycleConfig::default(),
//! );
//! manager.initialize().unwrap();
//! let related = manager.find_related_content("a", 5);
//! assert!(!related.is_empty());
//! ```

pub mod content;
pub mod coordinator;
pub mod error;
pub mod graph;
pub mod infer;
pub mod lifecycle;
pub mod relationship;
pub mod score;
pub mod store;
