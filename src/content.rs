//! Content item model.
//!
//! A [`ContentItem`] describes one saved piece of web content (article, video,
//! note) as the capture pipeline hands it to this subsystem. Items are owned
//! by the external content store; this crate only ever reads them.

use serde::{Deserialize, Serialize};

/// One saved content item, as read from the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identifier assigned by the capture pipeline.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Optional category (e.g. "tutorial", "reference").
    pub category: Option<String>,
    /// Concepts extracted from the content.
    pub concepts: Vec<String>,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// Importance in [0.0, 1.0]. Defaults to mid-scale.
    pub importance: f32,
    /// How many times the item has been opened.
    pub access_count: u64,
    /// Last access timestamp (seconds since UNIX epoch).
    pub last_accessed_at: u64,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
}

impl ContentItem {
    /// Create a new item with default importance and current timestamps.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            concepts: Vec::new(),
            tags: Vec::new(),
            importance: 0.5,
            access_count: 0,
            last_accessed_at: now,
            created_at: now,
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the concept list.
    pub fn with_concepts(mut self, concepts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the tag list.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the importance, clamped to [0.0, 1.0].
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    /// Set the access count.
    pub fn with_access_count(mut self, access_count: u64) -> Self {
        self.access_count = access_count;
        self
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }
}
