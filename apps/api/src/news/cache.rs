//! Process-wide cache of the last loaded record collection.
//!
//! A refresh builds a new `Snapshot` and swaps the `Arc`; published
//! snapshots are never mutated, so readers holding an older `Arc` keep a
//! consistent view.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::news::models::RecordCollection;
use crate::news::store::{RecordStore, SourceStatus};

#[derive(Debug)]
pub struct Snapshot {
    pub records: Arc<RecordCollection>,
    pub status: SourceStatus,
    pub produced_at: Instant,
}

pub struct RecordCache {
    store: RecordStore,
    ttl: Duration,
    current: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<()>,
}

impl RecordCache {
    pub fn new(store: RecordStore, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        // a poisoned lock still holds a fully published Arc
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        match self.current() {
            None => true,
            Some(snapshot) => now.saturating_duration_since(snapshot.produced_at) >= self.ttl,
        }
    }

    /// Returns the current snapshot, reloading first when it has expired.
    /// Concurrent callers wait for a single in-flight reload.
    pub async fn refresh_if_stale(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(snapshot) = self.fresh_snapshot() {
            debug!("Record cache refreshed by a concurrent request");
            return snapshot;
        }
        self.reload().await
    }

    /// Reloads unconditionally.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;
        self.reload().await
    }

    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        if self.is_stale(Instant::now()) {
            None
        } else {
            self.current()
        }
    }

    async fn reload(&self) -> Arc<Snapshot> {
        debug!("Reloading news records");
        let outcome = self.store.load().await;
        let snapshot = Arc::new(Snapshot {
            records: Arc::new(outcome.records),
            status: outcome.status,
            produced_at: Instant::now(),
        });

        match self.current.write() {
            Ok(mut guard) => *guard = Some(snapshot.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot.clone()),
        }
        snapshot
    }
}
