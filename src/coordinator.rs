//! Relationship coordinator.
//!
//! Sits between content lifecycle events and the inference engine:
//!
//! - **De-duplication**: at most one in-flight inference per content id. A
//!   registry maps id → pending-operation handle; a second caller for the
//!   same id parks on the handle and receives the first caller's outcome
//!   instead of duplicating work. Entries are cleared on completion, success
//!   or failure.
//! - **Debouncing**: rapid repeated updates to one id coalesce into a single
//!   pass. Re-arming replaces the pending deadline; a background worker
//!   fires entries whose window elapsed.
//! - **Persistence**: computed relationships supersede the prior outbound
//!   set, and the reciprocal of every retained relationship is ensured to
//!   exist (created only when absent).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;
use crate::infer::{InferenceConfig, InferenceEngine, InferenceOutcome};
use crate::relationship::{RelationKind, Relationship};
use crate::store::{ContentStore, RelationshipStore, StoreResult};

/// Result type for coordinator operations.
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;

/// Configuration for the relationship coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Inference parameters (threshold and cap).
    pub inference: InferenceConfig,
    /// How long an update may coalesce before its pass fires.
    pub debounce_window: Duration,
    /// How often the debounce worker checks for due entries.
    pub debounce_poll_interval: Duration,
    /// Relationships older than this are removed by maintenance.
    /// `None` disables the TTL sweep.
    pub relationship_ttl: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            debounce_window: Duration::from_millis(500),
            debounce_poll_interval: Duration::from_millis(50),
            relationship_ttl: None,
        }
    }
}

/// Report for one completed inference pass.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub content_id: String,
    /// Outbound relationships written.
    pub relationships_written: usize,
    /// Reciprocal records created because they were absent.
    pub reciprocals_created: usize,
    /// True when the content id was unknown or the input was malformed.
    pub skipped: bool,
    pub duration_ms: f64,
}

/// Running service statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub total_processed: u64,
    pub total_relationships: u64,
    /// Running mean of pass duration, in milliseconds.
    pub average_processing_ms: f64,
    /// Duration of the most recent pass, in milliseconds.
    pub last_processing_ms: f64,
    /// Debounced updates currently waiting to fire.
    pub pending_updates: usize,
}

/// Aggregate statistics over the stored relationship set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipStats {
    pub total: usize,
    pub by_kind: std::collections::BTreeMap<String, usize>,
    pub average_strength: f32,
    pub average_confidence: f32,
}

/// Filter criteria for [`RelationshipCoordinator::query_relationships`].
#[derive(Debug, Clone, Default)]
pub struct RelationshipCriteria {
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub kind: Option<RelationKind>,
    pub min_strength: Option<f32>,
}

/// Pending-operation handle shared between the owner and attached callers.
#[derive(Default)]
struct Inflight {
    outcome: Mutex<Option<Result<ProcessReport, String>>>,
    ready: Condvar,
}

#[derive(Default)]
struct StatsInner {
    total_processed: u64,
    total_relationships: u64,
    average_ms: f64,
    last_ms: f64,
}

struct Inner {
    content_store: Arc<dyn ContentStore>,
    relationship_store: Arc<dyn RelationshipStore>,
    engine: InferenceEngine,
    config: CoordinatorConfig,
    /// Content id → in-flight operation handle.
    inflight: DashMap<String, Arc<Inflight>>,
    /// Content id → debounce deadline. Re-arming replaces the deadline.
    pending: DashMap<String, Instant>,
    stats: Mutex<StatsInner>,
}

impl Inner {
    /// Run one inference pass with de-duplication.
    ///
    /// The first caller for an id computes; later callers arriving while the
    /// pass runs park on the handle and share its outcome.
    fn process_deduped(&self, content_id: &str) -> CoordinatorResult<ProcessReport> {
        let (handle, is_owner) = match self.inflight.entry(content_id.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Inflight::default());
                entry.insert(Arc::clone(&handle));
                (handle, true)
            }
        };

        if !is_owner {
            let mut outcome = handle.outcome.lock().expect("inflight lock poisoned");
            while outcome.is_none() {
                outcome = handle.ready.wait(outcome).expect("inflight lock poisoned");
            }
            return match outcome.as_ref().expect("outcome set before notify") {
                Ok(report) => Ok(report.clone()),
                Err(message) => Err(CoordinatorError::ProcessingFailed {
                    content_id: content_id.to_string(),
                    message: message.clone(),
                }),
            };
        }

        let result = self.process(content_id);
        {
            let mut outcome = handle.outcome.lock().expect("inflight lock poisoned");
            *outcome = Some(match &result {
                Ok(report) => Ok(report.clone()),
                Err(e) => Err(e.to_string()),
            });
            handle.ready.notify_all();
        }
        self.inflight.remove(content_id);
        result
    }

    /// The actual inference pass: read, score, supersede, persist.
    fn process(&self, content_id: &str) -> CoordinatorResult<ProcessReport> {
        let started = Instant::now();

        let Some(item) = self.content_store.read(content_id)? else {
            tracing::warn!(content_id, "content not found, skipping inference");
            return Ok(ProcessReport {
                content_id: content_id.to_string(),
                relationships_written: 0,
                reciprocals_created: 0,
                skipped: true,
                duration_ms: started.elapsed().as_secs_f64() * 1e3,
            });
        };
        let pool = self.content_store.list()?;

        let outcome = self
            .engine
            .infer(&item, &pool, self.engine.default_cap());
        if !outcome.success {
            tracing::warn!(content_id, "inference rejected the input, skipping");
            return Ok(ProcessReport {
                content_id: content_id.to_string(),
                relationships_written: 0,
                reciprocals_created: 0,
                skipped: true,
                duration_ms: started.elapsed().as_secs_f64() * 1e3,
            });
        }

        // Supersede the prior outbound set. The bidirectional guarantee is a
        // creation-time ensure: stale reverse records are cleaned up when
        // their own source reprocesses, cascades, or ages out.
        for old in self.relationship_store.list_by_source(content_id)? {
            self.relationship_store.delete(&old.id)?;
        }

        let (written, reciprocals_created) = self.write_outcome(&outcome)?;

        let duration_ms = started.elapsed().as_secs_f64() * 1e3;
        self.record_pass(written + reciprocals_created, duration_ms);
        tracing::debug!(
            content_id,
            written,
            reciprocals_created,
            duration_ms,
            "relationship pass complete"
        );

        Ok(ProcessReport {
            content_id: content_id.to_string(),
            relationships_written: written,
            reciprocals_created,
            skipped: false,
            duration_ms,
        })
    }

    /// Persist an inference outcome: outbound set as-is, reciprocals only
    /// when absent so an endpoint's own computation is never overwritten.
    fn write_outcome(&self, outcome: &InferenceOutcome) -> StoreResult<(usize, usize)> {
        let written = self.relationship_store.bulk_create(&outcome.relationships)?;
        let mut reciprocals_created = 0;
        for reciprocal in &outcome.reciprocals {
            if self.relationship_store.read(&reciprocal.id)?.is_none() {
                self.relationship_store.create(reciprocal)?;
                reciprocals_created += 1;
            }
        }
        Ok((written, reciprocals_created))
    }

    fn record_pass(&self, relationships: usize, duration_ms: f64) {
        let mut stats = self.stats.lock().expect("stats lock poisoned");
        stats.total_processed += 1;
        stats.total_relationships += relationships as u64;
        let n = stats.total_processed as f64;
        stats.average_ms += (duration_ms - stats.average_ms) / n;
        stats.last_ms = duration_ms;
    }
}

/// Coordinates inference passes, persistence, and statistics.
pub struct RelationshipCoordinator {
    inner: Arc<Inner>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RelationshipCoordinator {
    /// Create a coordinator and start its debounce worker.
    pub fn new(
        content_store: Arc<dyn ContentStore>,
        relationship_store: Arc<dyn RelationshipStore>,
        config: CoordinatorConfig,
    ) -> Self {
        let inner = Arc::new(Inner {
            content_store,
            relationship_store,
            engine: InferenceEngine::new(config.inference.clone()),
            config,
            inflight: DashMap::new(),
            pending: DashMap::new(),
            stats: Mutex::new(StatsInner::default()),
        });
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let inner = Arc::clone(&inner);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(inner.config.debounce_poll_interval);
                    let now = Instant::now();
                    let due: Vec<String> = inner
                        .pending
                        .iter()
                        .filter(|entry| *entry.value() <= now)
                        .map(|entry| entry.key().clone())
                        .collect();
                    for id in due {
                        // A re-arm may have pushed the deadline forward in
                        // the meantime; only fire if it is still due.
                        if inner
                            .pending
                            .remove_if(&id, |_, deadline| *deadline <= now)
                            .is_none()
                        {
                            continue;
                        }
                        if let Err(e) = inner.process_deduped(&id) {
                            tracing::warn!(
                                content_id = %id,
                                error = %e,
                                "debounced relationship update failed"
                            );
                        }
                    }
                }
            })
        };

        Self {
            inner,
            stop,
            worker: Some(worker),
        }
    }

    /// Trigger an inference pass for one content id, de-duplicated against
    /// any pass already in flight for the same id.
    pub fn process_content(&self, content_id: &str) -> CoordinatorResult<ProcessReport> {
        self.inner.process_deduped(content_id)
    }

    /// Note that a content item changed. Rapid repeated calls for the same
    /// id coalesce into a single pass once the debounce window elapses.
    pub fn notify_content_updated(&self, content_id: &str) {
        let deadline = Instant::now() + self.inner.config.debounce_window;
        self.inner.pending.insert(content_id.to_string(), deadline);
        tracing::debug!(content_id, "debounced relationship update armed");
    }

    /// Cascade-remove every relationship where the id is source or target.
    /// Returns the number of records removed.
    pub fn remove_content_relationships(&self, content_id: &str) -> CoordinatorResult<usize> {
        self.inner.pending.remove(content_id);

        let mut ids: HashSet<String> = HashSet::new();
        for rel in self.inner.relationship_store.list_by_source(content_id)? {
            ids.insert(rel.id);
        }
        for rel in self.inner.relationship_store.list_by_target(content_id)? {
            ids.insert(rel.id);
        }
        let mut removed = 0;
        for id in ids {
            if self.inner.relationship_store.delete(&id)? {
                removed += 1;
            }
        }
        tracing::info!(content_id, removed, "cascade-removed relationships");
        Ok(removed)
    }

    /// Clear all persisted relationships and recompute from the full content
    /// set. Returns the number of records in the store afterwards. Store
    /// failures propagate; per-item inference failures are logged and do not
    /// abort the batch.
    pub fn rebuild_all_relationships(&self) -> CoordinatorResult<usize> {
        self.inner.relationship_store.clear()?;
        let items = self.inner.content_store.list()?;

        for item in &items {
            let started = Instant::now();
            let outcome = self
                .inner
                .engine
                .infer(item, &items, self.inner.engine.default_cap());
            if !outcome.success {
                tracing::warn!(content_id = %item.id, "inference rejected item during rebuild");
                continue;
            }
            match self.inner.write_outcome(&outcome) {
                Ok((written, reciprocals)) => {
                    self.inner
                        .record_pass(written + reciprocals, started.elapsed().as_secs_f64() * 1e3);
                }
                Err(e) => {
                    tracing::warn!(
                        content_id = %item.id,
                        error = %e,
                        "failed to persist relationships during rebuild"
                    );
                }
            }
        }
        let total = self.inner.relationship_store.list_all()?.len();
        tracing::info!(items = items.len(), total, "relationship rebuild complete");
        Ok(total)
    }

    /// Remove relationships past the configured TTL. No-op without a TTL.
    pub fn perform_maintenance(&self) -> CoordinatorResult<usize> {
        let Some(ttl) = self.inner.config.relationship_ttl else {
            return Ok(0);
        };
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let cutoff = now.saturating_sub(ttl.as_secs());

        let mut removed = 0;
        for rel in self.inner.relationship_store.list_all()? {
            if rel.last_updated < cutoff && self.inner.relationship_store.delete(&rel.id)? {
                removed += 1;
            }
        }
        tracing::info!(removed, "maintenance removed expired relationships");
        Ok(removed)
    }

    /// Query stored relationships by criteria, strongest first.
    pub fn query_relationships(
        &self,
        criteria: &RelationshipCriteria,
    ) -> CoordinatorResult<Vec<Relationship>> {
        let store = &self.inner.relationship_store;
        let mut records = if let Some(source) = &criteria.source_id {
            store.list_by_source(source)?
        } else if let Some(target) = &criteria.target_id {
            store.list_by_target(target)?
        } else if let Some(kind) = criteria.kind {
            store.list_by_kind(kind)?
        } else {
            store.list_all()?
        };

        records.retain(|rel| {
            criteria
                .source_id
                .as_ref()
                .is_none_or(|s| rel.source_id == *s)
                && criteria
                    .target_id
                    .as_ref()
                    .is_none_or(|t| rel.target_id == *t)
                && criteria.kind.is_none_or(|k| rel.kind == k)
                && criteria.min_strength.is_none_or(|min| rel.strength >= min)
        });
        records.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        Ok(records)
    }

    /// Aggregate statistics over the stored relationship set.
    pub fn get_relationship_stats(&self) -> CoordinatorResult<RelationshipStats> {
        let records = self.inner.relationship_store.list_all()?;
        let total = records.len();
        let mut by_kind = std::collections::BTreeMap::new();
        let mut strength_sum = 0.0f32;
        let mut confidence_sum = 0.0f32;
        for rel in &records {
            *by_kind.entry(rel.kind.label().to_string()).or_insert(0) += 1;
            strength_sum += rel.strength;
            confidence_sum += rel.confidence;
        }
        let denom = total.max(1) as f32;
        Ok(RelationshipStats {
            total,
            by_kind,
            average_strength: strength_sum / denom,
            average_confidence: confidence_sum / denom,
        })
    }

    /// Running service statistics.
    pub fn get_service_stats(&self) -> ServiceStats {
        let stats = self.inner.stats.lock().expect("stats lock poisoned");
        ServiceStats {
            total_processed: stats.total_processed,
            total_relationships: stats.total_relationships,
            average_processing_ms: stats.average_ms,
            last_processing_ms: stats.last_ms,
            pending_updates: self.inner.pending.len(),
        }
    }

    /// Stop the debounce worker. Pending debounced updates are discarded;
    /// an in-flight pass finishes on its caller's thread.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for RelationshipCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RelationshipCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipCoordinator")
            .field("inflight", &self.inner.inflight.len())
            .field("pending", &self.inner.pending.len())
            .finish()
    }
}
