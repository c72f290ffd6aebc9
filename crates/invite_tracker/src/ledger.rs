//! Durable, idempotent record of unique joins per owner/domain pair.
//!
//! The ledger is the source of truth for per-owner-domain counts and the
//! per-owner last-notification id. It is the sole writer of durable state;
//! every other component reads through its operations. Mutation goes
//! through one coarse async mutex, which keeps `mark_unique_if_first`
//! linearizable and keeps flushes from observing a torn identity-set/count
//! pair. Expected load is bounded by concurrent player connections, so a
//! finer per-key discipline is not worth its complexity.
//!
//! Persistence is a single JSON snapshot written through a temp file and
//! an atomic rename, so a crash mid-flush leaves the previous snapshot
//! intact. In-memory state stays authoritative between flushes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{
    fs as tokio_fs,
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::events::PlayerId;

/// Unique-visit state for one `(owner, domain)` key.
///
/// Invariant: `count == identities.len()`; the set only grows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Identities that have already triggered a unique join
    pub identities: BTreeSet<PlayerId>,
    /// Persisted unique-join count, kept in sync with the set size
    pub count: u64,
}

/// Per-owner durable state: visit records per domain plus the id of the
/// owner's last live notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OwnerRecord {
    #[serde(default)]
    domains: HashMap<String, VisitRecord>,
    #[serde(default)]
    last_message_id: Option<String>,
}

/// The full serializable ledger state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    #[serde(default)]
    owners: HashMap<String, OwnerRecord>,
}

/// Durable unique-visit ledger backed by a JSON snapshot file.
pub struct VisitLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
    // Serializes snapshot writes. Flushes share one temp path, so two
    // in-flight writes would truncate each other's temp file and race
    // on the rename.
    flush_lock: Mutex<()>,
}

impl VisitLedger {
    /// Opens the ledger at `path`, loading the existing snapshot or
    /// starting empty when the file does not exist. Parent directories are
    /// created as needed. A present-but-corrupt snapshot is an error.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio_fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::DirectoryCreate(parent.to_path_buf(), e))?;
            }
        }

        let state = if path.exists() {
            let contents = tokio_fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::FileRead(path.clone(), e))?;
            if contents.trim().is_empty() {
                LedgerState::default()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| StorageError::Deserialization(path.clone(), e))?
            }
        } else {
            debug!("No ledger snapshot at {}, starting empty", path.display());
            LedgerState::default()
        };

        let total: u64 = state
            .owners
            .values()
            .flat_map(|o| o.domains.values())
            .map(|r| r.count)
            .sum();
        info!(
            "Visit ledger opened: {} owners, {} unique joins on record",
            state.owners.len(),
            total
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
            flush_lock: Mutex::new(()),
        })
    }

    /// Records `identity` against `(owner, domain)` if it has not been seen
    /// there before.
    ///
    /// Returns `true` exactly once per identity per key: the first caller
    /// inserts the identity and syncs the count to the new set size; every
    /// later call (including concurrent ones, serialized by the state lock)
    /// returns `false` and mutates nothing.
    pub async fn mark_unique_if_first(
        &self,
        owner_id: &str,
        domain: &str,
        identity: PlayerId,
    ) -> bool {
        let mut state = self.state.lock().await;
        let record = state
            .owners
            .entry(owner_id.to_string())
            .or_default()
            .domains
            .entry(domain.to_string())
            .or_default();

        if !record.identities.insert(identity) {
            return false;
        }
        record.count = record.identities.len() as u64;
        true
    }

    /// Returns the persisted unique-join count for `(owner, domain)`, or 0
    /// if the key has never been seen.
    pub async fn invite_count(&self, owner_id: &str, domain: &str) -> u64 {
        let state = self.state.lock().await;
        state
            .owners
            .get(owner_id)
            .and_then(|o| o.domains.get(domain))
            .map(|r| r.count)
            .unwrap_or(0)
    }

    /// Returns the id of the owner's last live notification, if any.
    pub async fn last_message_id(&self, owner_id: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .owners
            .get(owner_id)
            .and_then(|o| o.last_message_id.clone())
    }

    /// Records the owner's new live notification id. Last writer wins.
    pub async fn set_last_message_id(&self, owner_id: &str, message_id: impl Into<String>) {
        let mut state = self.state.lock().await;
        state
            .owners
            .entry(owner_id.to_string())
            .or_default()
            .last_message_id = Some(message_id.into());
    }

    /// Synchronously flushes the ledger to its snapshot file.
    ///
    /// Serialization happens under the state lock, so a flush never
    /// observes a half-applied mutation; the file write happens after the
    /// lock is released, serialized against other in-flight flushes so
    /// overlapping saves cannot clobber each other's temp file.
    pub async fn save(&self) -> StorageResult<()> {
        let json = {
            let state = self.state.lock().await;
            serde_json::to_string_pretty(&*state).map_err(StorageError::Serialization)?
        };
        let _flush = self.flush_lock.lock().await;
        self.write_snapshot(&json).await
    }

    /// Schedules a flush on a background task without blocking the caller.
    ///
    /// Ordering between overlapping flushes is best-effort (last flush
    /// wins); failures are logged and never propagated.
    pub fn save_async(self: &Arc<Self>) {
        let ledger = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = ledger.save().await {
                warn!("Async ledger flush failed: {}", e);
            }
        });
    }

    /// Path of the backing snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_snapshot(&self, json: &str) -> StorageResult<()> {
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = tokio_fs::File::create(&temp_path)
            .await
            .map_err(|e| StorageError::FileCreate(temp_path.clone(), e))?;

        file.write_all(json.as_bytes())
            .await
            .map_err(|e| StorageError::FileWrite(temp_path.clone(), e))?;

        file.sync_all()
            .await
            .map_err(|e| StorageError::FileSync(temp_path.clone(), e))?;

        // Atomic rename
        tokio_fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::FileRename(temp_path, self.path.clone(), e))?;

        debug!("Ledger flushed to {}", self.path.display());
        Ok(())
    }
}
