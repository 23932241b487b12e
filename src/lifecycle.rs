//! Graph lifecycle manager.
//!
//! Owns one [`KnowledgeGraphEngine`] behind a single `RwLock` and two
//! periodic schedules: snapshot persistence and layout refinement. On
//! initialization the graph is restored from the snapshot sink, or rebuilt
//! from the content and relationship stores when no usable snapshot exists.
//! Snapshot failures are logged and never fatal; the in-memory graph stays
//! authoritative and the next tick retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::content::ContentItem;
use crate::error::LifecycleError;
use crate::graph::ContentCluster;
use crate::graph::engine::{GraphConfig, KnowledgeGraphEngine, RelatedNode, RelatedOptions};
use crate::graph::query::{GraphQuery, QueryResult};
use crate::graph::snapshot::GraphSnapshot;
use crate::graph::stats::GraphStats;
use crate::relationship::Relationship;
use crate::store::{ContentStore, RelationshipStore, SnapshotStore};

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

/// Configuration for the lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How often the graph is snapshotted to the sink.
    pub snapshot_interval: Duration,
    /// How often the layout is refined in the background.
    pub layout_interval: Duration,
    /// Layout iterations for a full (re)build.
    pub initial_layout_iterations: usize,
    /// Layout iterations per background refinement tick.
    pub refine_iterations: usize,
    /// Maximum nodes admitted during a rebuild. Items past the cap, in
    /// content-store listing order, are dropped with a warning.
    pub max_nodes: usize,
    /// Graph engine configuration.
    pub graph: GraphConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: Duration::from_secs(30),
            layout_interval: Duration::from_secs(60),
            initial_layout_iterations: 120,
            refine_iterations: 30,
            max_nodes: 5_000,
            graph: GraphConfig::default(),
        }
    }
}

/// Owns the knowledge graph engine and its background schedules.
pub struct GraphLifecycleManager {
    graph: Arc<RwLock<KnowledgeGraphEngine>>,
    content_store: Arc<dyn ContentStore>,
    relationship_store: Arc<dyn RelationshipStore>,
    snapshot_store: Arc<dyn SnapshotStore>,
    config: LifecycleConfig,
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

/// Sleep in short steps so a stop request is honored promptly, invoking
/// `tick` once per elapsed interval.
fn run_periodic(stop: &AtomicBool, interval: Duration, mut tick: impl FnMut()) {
    let step = Duration::from_millis(50).min(interval);
    let mut elapsed = Duration::ZERO;
    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(step);
        elapsed += step;
        if elapsed >= interval {
            tick();
            elapsed = Duration::ZERO;
        }
    }
}

impl GraphLifecycleManager {
    /// Create a manager. The graph stays empty until [`initialize`] runs.
    ///
    /// [`initialize`]: GraphLifecycleManager::initialize
    pub fn new(
        content_store: Arc<dyn ContentStore>,
        relationship_store: Arc<dyn RelationshipStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
        config: LifecycleConfig,
    ) -> Self {
        let graph = Arc::new(RwLock::new(KnowledgeGraphEngine::new(config.graph.clone())));
        Self {
            graph,
            content_store,
            relationship_store,
            snapshot_store,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Restore the graph and start both schedules.
    ///
    /// Loads the persisted snapshot; when it is absent, empty, or unreadable
    /// the graph is rebuilt from the two stores instead. Only store failures
    /// during a rebuild propagate — snapshot problems never do.
    pub fn initialize(&mut self) -> LifecycleResult<()> {
        let restored = match self.snapshot_store.load() {
            Ok(Some(snapshot)) if !snapshot.is_empty() => {
                let mut graph = self.graph.write().expect("graph lock poisoned");
                graph.import_snapshot(snapshot);
                tracing::info!(
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "graph restored from snapshot"
                );
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(error = %e, "snapshot load failed, falling back to rebuild");
                false
            }
        };
        if !restored {
            self.rebuild_graph()?;
        }
        self.start_schedules();
        Ok(())
    }

    /// Rebuild the graph from the content and relationship stores.
    ///
    /// Always clears first, so repeated calls are idempotent. Store failures
    /// propagate: a partial rebuild would leave the graph inconsistent.
    pub fn rebuild_graph(&self) -> LifecycleResult<()> {
        let items = self.content_store.list()?;
        let relationships = self.relationship_store.list_all()?;

        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.clear();

        if items.len() > self.config.max_nodes {
            tracing::warn!(
                total = items.len(),
                max = self.config.max_nodes,
                "content set exceeds node cap, truncating in listing order"
            );
        }
        for item in items.iter().take(self.config.max_nodes) {
            graph.add_content(item);
        }

        let mut skipped = 0usize;
        for relationship in &relationships {
            if graph.add_relationship(relationship).is_none() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "relationships without graph endpoints skipped");
        }

        graph.create_clusters();
        graph.update_layout(self.config.initial_layout_iterations);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            clusters = graph.cluster_count(),
            "graph rebuilt from stores"
        );
        Ok(())
    }

    fn start_schedules(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        // Snapshot schedule. The export happens synchronously under the read
        // lock, so each save captures a consistent point-in-time state.
        {
            let graph = Arc::clone(&self.graph);
            let sink = Arc::clone(&self.snapshot_store);
            let stop = Arc::clone(&self.stop);
            let interval = self.config.snapshot_interval;
            self.handles.push(std::thread::spawn(move || {
                run_periodic(&stop, interval, || {
                    let snapshot = graph.read().expect("graph lock poisoned").export_snapshot();
                    if let Err(e) = sink.save(&snapshot) {
                        tracing::warn!(error = %e, "snapshot save failed, will retry next tick");
                    } else {
                        tracing::debug!(nodes = snapshot.nodes.len(), "snapshot saved");
                    }
                });
            }));
        }

        // Layout refinement schedule: fewer iterations than a full rebuild.
        {
            let graph = Arc::clone(&self.graph);
            let stop = Arc::clone(&self.stop);
            let interval = self.config.layout_interval;
            let iterations = self.config.refine_iterations;
            self.handles.push(std::thread::spawn(move || {
                run_periodic(&stop, interval, || {
                    graph
                        .write()
                        .expect("graph lock poisoned")
                        .update_layout(iterations);
                });
            }));
        }
    }

    /// Stop both schedules, attempt a final snapshot save, and clear the
    /// in-memory graph.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let was_running = !self.handles.is_empty();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        // A manager that never initialized has nothing worth saving, and an
        // empty export must not overwrite a good persisted snapshot.
        if was_running {
            if let Err(e) = self.persist_snapshot() {
                tracing::warn!(error = %e, "final snapshot save failed");
            }
        }
        self.graph.write().expect("graph lock poisoned").clear();
        tracing::info!("graph lifecycle manager stopped");
    }

    // -----------------------------------------------------------------------
    // Exposed query surface
    // -----------------------------------------------------------------------

    /// Related content for an id, default traversal options.
    pub fn find_related_content(&self, content_id: &str, max_results: usize) -> Vec<RelatedNode> {
        self.find_related_content_with(content_id, max_results, &RelatedOptions::default())
    }

    /// Related content with explicit traversal options.
    pub fn find_related_content_with(
        &self,
        content_id: &str,
        max_results: usize,
        options: &RelatedOptions,
    ) -> Vec<RelatedNode> {
        self.graph
            .read()
            .expect("graph lock poisoned")
            .find_related(content_id, max_results, options)
    }

    /// Run a filtered graph query.
    pub fn query_graph(&self, query: &GraphQuery) -> QueryResult {
        self.graph.read().expect("graph lock poisoned").query_graph(query)
    }

    /// Summary statistics for the current graph.
    pub fn get_graph_stats(&self) -> GraphStats {
        self.graph.read().expect("graph lock poisoned").stats()
    }

    /// The cluster containing the node for `content_id`, if any.
    pub fn get_content_cluster(&self, content_id: &str) -> Option<ContentCluster> {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .get_content_cluster(content_id)
    }

    /// Run a foreground layout pass.
    pub fn update_layout(&self, iterations: usize) {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .update_layout(iterations);
    }

    /// Export the full graph state.
    pub fn export_graph_data(&self) -> GraphSnapshot {
        self.graph.read().expect("graph lock poisoned").export_snapshot()
    }

    /// Replace the graph state with a snapshot.
    pub fn import_graph_data(&self, snapshot: GraphSnapshot) {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .import_snapshot(snapshot);
    }

    /// Export and save a snapshot now.
    pub fn persist_snapshot(&self) -> LifecycleResult<()> {
        let snapshot = self.export_graph_data();
        self.snapshot_store.save(&snapshot)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Incremental graph maintenance
    // -----------------------------------------------------------------------

    /// Create or refresh the node for a content item.
    pub fn sync_content(&self, item: &ContentItem) {
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.add_content(item);
    }

    /// Mirror a relationship as an edge. Returns false when an endpoint node
    /// is missing (a reported no-op, not an error).
    pub fn sync_relationship(&self, relationship: &Relationship) -> bool {
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.add_relationship(relationship).is_some()
    }

    /// Remove the node for a content id along with its incident edges.
    pub fn remove_content(&self, content_id: &str) -> bool {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .remove_content(content_id)
    }

    /// Remove the edge for a relationship id.
    pub fn remove_relationship(&self, relationship_id: &str) -> bool {
        self.graph
            .write()
            .expect("graph lock poisoned")
            .remove_relationship(relationship_id)
    }
}

impl Drop for GraphLifecycleManager {
    fn drop(&mut self) {
        if !self.stop.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for GraphLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read().expect("graph lock poisoned");
        f.debug_struct("GraphLifecycleManager")
            .field("nodes", &graph.node_count())
            .field("edges", &graph.edge_count())
            .field("running", &!self.handles.is_empty())
            .finish()
    }
}
