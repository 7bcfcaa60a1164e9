//! Snapshot persistence and cache management for viewmill
//!
//! When `cache-views` is enabled in the project file, the registry persists
//! its synthesized, validated definitions as a JSON snapshot so subsequent
//! processes skip synthesis entirely. This module owns that persistence
//! ([`SnapshotStore`], [`FsSnapshotStore`]) and the operator-facing cache
//! surface ([`ViewCacheManager`]).
//!
//! # Snapshot Layout
//!
//! The snapshot is a single `views.json` file in the cache directory (see
//! [`crate::config::ProjectConfig::cache_dir`]). Writes are atomic: the
//! content goes to a temporary file in the same directory which is then
//! persisted over the final name, so readers never observe a partial
//! snapshot.
//!
//! # Enable Markers
//!
//! `enable()`/`disable()` manage a `views.disabled` marker file next to the
//! snapshot. The marker gates caching independently of the `cache-views`
//! switch, so an operator can pause caching without editing the project
//! file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File name of the persisted definition snapshot.
pub const SNAPSHOT_FILE: &str = "views.json";
/// Marker file that pauses caching when present.
pub const DISABLED_MARKER: &str = "views.disabled";

/// Persisted form of the synthesized registry: definition ids to validated
/// raw option maps, in registry insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Ordered `(id, options)` pairs.
    pub views: Vec<(String, Map<String, Value>)>,
}

/// Storage contract for registry snapshots.
///
/// The registry only needs load/store/clear; hosts with their own cache
/// infrastructure can substitute an implementation backed by it.
pub trait SnapshotStore {
    /// Load the snapshot, if one is present and readable.
    fn load(&self) -> Result<Option<Snapshot>>;
    /// Persist the snapshot, replacing any previous one.
    fn store(&self, snapshot: &Snapshot) -> Result<()>;
    /// Remove the snapshot. Removing a missing snapshot is not an error.
    fn clear(&self) -> Result<()>;
}

/// Filesystem-backed snapshot store.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    cache_dir: PathBuf,
}

impl FsSnapshotStore {
    /// Create a store rooted at the given cache directory.
    #[must_use]
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    fn marker_path(&self) -> PathBuf {
        self.cache_dir.join(DISABLED_MARKER)
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;

        match serde_json::from_str(&content) {
            Ok(snapshot) => {
                debug!("Loaded snapshot from {}", path.display());
                Ok(Some(snapshot))
            }
            Err(e) => {
                // A corrupt snapshot is treated as a miss so the registry
                // re-synthesizes instead of failing the whole process.
                info!("Discarding unreadable snapshot {}: {e}", path.display());
                std::fs::remove_file(&path)
                    .with_context(|| format!("removing snapshot {}", path.display()))?;
                Ok(None)
            }
        }
    }

    fn store(&self, snapshot: &Snapshot) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("creating cache directory {}", self.cache_dir.display()))?;

        let content = serde_json::to_vec_pretty(snapshot).context("serializing snapshot")?;

        let mut temp = NamedTempFile::new_in(&self.cache_dir)
            .with_context(|| format!("creating temp file in {}", self.cache_dir.display()))?;
        temp.write_all(&content).context("writing snapshot")?;

        let path = self.snapshot_path();
        temp.persist(&path)
            .with_context(|| format!("persisting snapshot {}", path.display()))?;

        debug!("Stored snapshot at {}", path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.snapshot_path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Cleared snapshot {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing snapshot {}", path.display()))
            }
        }
    }
}

/// Host-side cache layer through which [`ViewCacheManager::revoke`] requests
/// a clear.
///
/// Lifecycle events (module activation, deactivation) should not reach into
/// the view cache directly; they go through the host's cache registry,
/// which eventually calls [`ViewCacheManager::clear`].
pub trait CacheRegistry {
    /// Request that the named cache be cleared.
    fn request_clear(&self, cache_name: &str) -> Result<()>;
}

/// Name under which the view cache registers with a [`CacheRegistry`].
pub const CACHE_NAME: &str = "views";

/// Size, checksum and freshness of the persisted snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStat {
    /// Whether a snapshot file is present.
    pub present: bool,
    /// Whether caching is currently enabled (no disabled marker).
    pub enabled: bool,
    /// Snapshot size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the snapshot content.
    pub checksum: Option<String>,
    /// Last modification time of the snapshot.
    pub modified: Option<DateTime<Utc>>,
}

/// Operator-facing cache surface: clear, enable, disable, stat, revoke.
#[derive(Debug, Clone)]
pub struct ViewCacheManager {
    store: FsSnapshotStore,
}

impl ViewCacheManager {
    /// Create a manager over the given cache directory.
    #[must_use]
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { store: FsSnapshotStore::new(cache_dir) }
    }

    /// The underlying snapshot store.
    #[must_use]
    pub fn store(&self) -> &FsSnapshotStore {
        &self.store
    }

    /// Drop the persisted snapshot; the next registry build re-synthesizes.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    /// Remove the disabled marker, re-allowing snapshot reads and writes.
    pub fn enable(&self) -> Result<()> {
        let marker = self.store.marker_path();
        match std::fs::remove_file(&marker) {
            Ok(()) => {
                info!("View caching enabled");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing marker {}", marker.display())),
        }
    }

    /// Write the disabled marker and drop the current snapshot.
    pub fn disable(&self) -> Result<()> {
        std::fs::create_dir_all(&self.store.cache_dir).with_context(|| {
            format!("creating cache directory {}", self.store.cache_dir.display())
        })?;
        let marker = self.store.marker_path();
        std::fs::write(&marker, b"")
            .with_context(|| format!("writing marker {}", marker.display()))?;
        self.store.clear()?;
        info!("View caching disabled");
        Ok(())
    }

    /// Whether caching is enabled (no disabled marker present).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.store.marker_path().is_file()
    }

    /// Report presence, size, checksum and modification time of the
    /// snapshot.
    pub fn stat(&self) -> Result<CacheStat> {
        let path = self.store.snapshot_path();
        if !path.is_file() {
            return Ok(CacheStat {
                present: false,
                enabled: self.is_enabled(),
                size: 0,
                checksum: None,
                modified: None,
            });
        }

        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("reading metadata of {}", path.display()))?;
        let content = std::fs::read(&path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;

        let mut hasher = Sha256::new();
        hasher.update(&content);
        let checksum = hex::encode(hasher.finalize());

        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(CacheStat {
            present: true,
            enabled: self.is_enabled(),
            size: metadata.len(),
            checksum: Some(checksum),
            modified,
        })
    }

    /// Request a clear through the host's cache layer instead of clearing
    /// directly. Wired to module activation/deactivation events by the
    /// host.
    pub fn revoke(registry: &dyn CacheRegistry) -> Result<()> {
        registry.request_clear(CACHE_NAME)
    }
}
