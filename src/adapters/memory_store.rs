use crate::adapters::{filter_query, upsert_into};
use crate::domain::model::{TournamentQuery, TournamentRecord, UpsertStats};
use crate::domain::ports::TournamentStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    records: Vec<TournamentRecord>,
}

/// In-memory tournament store with the same upsert/query semantics as the
/// file-backed one. Used by tests and throwaway runs.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1,
                records: Vec::new(),
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn snapshot(&self) -> Vec<TournamentRecord> {
        self.inner.lock().await.records.clone()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn upsert_batch(&self, records: &[TournamentRecord]) -> Result<UpsertStats> {
        let mut inner = self.inner.lock().await;
        let mut next_id = inner.next_id;
        let stats = upsert_into(&mut inner.records, &mut next_id, records);
        inner.next_id = next_id;
        Ok(stats)
    }

    async fn query(&self, query: &TournamentQuery) -> Result<Vec<TournamentRecord>> {
        let inner = self.inner.lock().await;
        Ok(filter_query(&inner.records, query, Local::now().date_naive()))
    }
}
