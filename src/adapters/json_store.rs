use crate::adapters::{filter_query, upsert_into};
use crate::domain::model::{TournamentQuery, TournamentRecord, UpsertStats};
use crate::domain::ports::TournamentStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const STORE_FILE: &str = "tournaments.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    next_id: u64,
    records: Vec<TournamentRecord>,
}

/// File-backed tournament store: one JSON document under the output
/// directory, rewritten in full per upsert batch. Good enough for a
/// single-process pipeline; the hand-off stays a single append/merge
/// transaction per run.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles against the backing file.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(base_path: &str) -> Self {
        Self {
            path: Path::new(base_path).join(STORE_FILE),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<StoreState> {
        if !self.path.exists() {
            return Ok(StoreState {
                next_id: 1,
                ..Default::default()
            });
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl TournamentStore for JsonFileStore {
    async fn upsert_batch(&self, records: &[TournamentRecord]) -> Result<UpsertStats> {
        let _guard = self.lock.lock().await;
        let mut state = self.load()?;
        let stats = upsert_into(&mut state.records, &mut state.next_id, records);
        self.save(&state)?;
        tracing::debug!(
            "Store now holds {} records ({} inserted, {} updated)",
            state.records.len(),
            stats.inserted,
            stats.updated
        );
        Ok(stats)
    }

    async fn query(&self, query: &TournamentQuery) -> Result<Vec<TournamentRecord>> {
        let _guard = self.lock.lock().await;
        let state = self.load()?;
        Ok(filter_query(
            &state.records,
            query,
            Local::now().date_naive(),
        ))
    }
}
