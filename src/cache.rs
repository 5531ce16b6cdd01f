//! Process-local model cache.
//!
//! Holds at most one loaded artifact, tagged with the version it came from.
//! Freshness is decided by comparing that tag against the store's pointer
//! on every `get`: one cheap pointer read per request, no cross-process
//! broadcast. Each serving process self-heals on its next request after a
//! publish elsewhere.

use crate::error::{Error, Result};
use crate::store::{Artifact, ArtifactStore, ModelVersion};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    reloads: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

struct CacheEntry {
    version: ModelVersion,
    artifact: Arc<Artifact>,
}

/// Lazily-populated holder of the currently loaded model.
///
/// Lifecycle per process: empty, then loaded at some version, replaced on
/// version mismatch, cleared by `invalidate`.
pub struct ModelCache {
    store: Arc<ArtifactStore>,
    entry: RwLock<Option<CacheEntry>>,
    stats: CacheStats,
}

impl ModelCache {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            entry: RwLock::new(None),
            stats: CacheStats::default(),
        }
    }

    /// Return the artifact for the store's current version, reloading from
    /// storage only when the cached tag is absent or stale.
    ///
    /// Fails with `ModelNotTrained` when nothing has ever been published.
    pub fn get(&self) -> Result<Arc<Artifact>> {
        let current = self
            .store
            .current_version()?
            .ok_or(Error::ModelNotTrained)?;

        {
            let guard = self.entry.read();
            if let Some(entry) = guard.as_ref() {
                if entry.version == current {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Arc::clone(&entry.artifact));
                }
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let artifact = Arc::new(self.store.load(current)?);
        // A concurrent reader may have reloaded meanwhile; last write wins.
        // Either entry names a version the pointer held during this call.
        *self.entry.write() = Some(CacheEntry {
            version: current,
            artifact: Arc::clone(&artifact),
        });
        self.stats.reloads.fetch_add(1, Ordering::Relaxed);
        debug!(version = %current, "model cache reloaded");
        Ok(artifact)
    }

    /// Force the next `get` to reload regardless of version match. Used
    /// right after a local publish so the same process never serves its
    /// own stale entry.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
        debug!("model cache invalidated");
    }

    /// Version tag of the entry currently held, if any.
    pub fn cached_version(&self) -> Option<ModelVersion> {
        self.entry.read().as_ref().map(|e| e.version)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
