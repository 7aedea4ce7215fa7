//! In-memory process registry

use crate::process::{ProcessHandle, ProcessRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Records keyed by handle. Lives for the lifetime of the host; entries are
/// only dropped by [`ProcessStore::clear`] at shutdown.
#[derive(Debug, Default)]
pub struct ProcessStore {
    records: RwLock<HashMap<ProcessHandle, Arc<ProcessRecord>>>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: Arc<ProcessRecord>) {
        self.records.write().await.insert(record.handle, record);
    }

    pub async fn get(&self, handle: &ProcessHandle) -> Option<Arc<ProcessRecord>> {
        self.records.read().await.get(handle).cloned()
    }

    pub async fn contains(&self, handle: &ProcessHandle) -> bool {
        self.records.read().await.contains_key(handle)
    }

    /// All records, oldest first
    pub async fn all(&self) -> Vec<Arc<ProcessRecord>> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.started_at);
        records
    }

    /// Records whose status is still running
    pub async fn running(&self) -> Vec<Arc<ProcessRecord>> {
        self.all()
            .await
            .into_iter()
            .filter(|r| r.status().is_running())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every record, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut records = self.records.write().await;
        let count = records.len();
        records.clear();
        count
    }
}
