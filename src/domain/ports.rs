use crate::domain::model::{
    Level, RunSummary, ScrapedDocument, Sport, TournamentQuery, TournamentRecord, UpsertStats,
};
use crate::utils::error::{ExtractError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The fixed extraction schema sent with every service call.
pub const EXTRACTION_FIELDS: &[&str] = &[
    "name",
    "sport",
    "level",
    "date_info",
    "registration_deadline",
    "venue",
    "summary",
];

/// Request half of the extraction-service boundary: the raw page text plus the
/// schema and the closed sport/level sets the service must choose from.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest {
    pub raw_text: String,
    pub source_url: String,
    pub fields: Vec<String>,
    pub sports: Vec<String>,
    pub levels: Vec<String>,
}

impl ExtractionRequest {
    pub fn for_document(document: &ScrapedDocument) -> Self {
        Self {
            raw_text: document.raw_text.clone(),
            source_url: document.source_url.clone(),
            fields: EXTRACTION_FIELDS.iter().map(|f| f.to_string()).collect(),
            sports: Sport::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            levels: Level::ALL.iter().map(|l| l.as_str().to_string()).collect(),
        }
    }
}

/// Response half of the boundary. Every field is optional on the wire; the
/// field extractor decides what a usable candidate requires. Unknown response
/// fields are dropped by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExtraction {
    pub name: Option<String>,
    pub sport: Option<String>,
    pub level: Option<String>,
    #[serde(default)]
    pub date_info: Vec<String>,
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub venue: Vec<String>,
    pub summary: Option<String>,
    pub confidence_score: Option<f64>,
}

/// Text-understanding service seam. Invoked once per document; any concrete
/// provider is swappable behind this trait.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> std::result::Result<RawExtraction, ExtractError>;
}

/// Storage collaborator seam. Assigns surrogate keys and is responsible for
/// natural-key idempotency; the pipeline only ever hands over one fully
/// consolidated batch per run.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn upsert_batch(&self, records: &[TournamentRecord]) -> Result<UpsertStats>;
    async fn query(&self, query: &TournamentQuery) -> Result<Vec<TournamentRecord>>;
}

pub trait ConfigProvider: Send + Sync {
    fn service_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn max_retries(&self) -> u32;
    fn min_confidence(&self) -> f64;
    fn timeout_seconds(&self) -> u64;
}

/// Cooperative cancellation flag, checked at stage boundaries only so that
/// in-flight extraction calls drain instead of being hard-cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Output of one consolidation run: the final record set plus the operational
/// summary.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<TournamentRecord>,
    pub summary: RunSummary,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(
        &self,
        documents: Vec<ScrapedDocument>,
        cancel: &CancelToken,
    ) -> Result<PipelineOutput>;
}
