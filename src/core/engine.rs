use crate::domain::model::{RejectReason, RunSummary, ScrapedDocument, UpsertStats};
use crate::domain::ports::{CancelToken, Pipeline, TournamentStore};
use crate::utils::error::{EtlError, Result};

/// Drives one consolidation run end to end: pipeline, summary logging, then a
/// single hand-off of the fully merged batch to the store. Consumers never
/// observe a partially consolidated run; a storage failure surfaces as a
/// fatal run error and nothing else is written.
pub struct ConsolidationEngine<P: Pipeline, S: TournamentStore> {
    pipeline: P,
    store: S,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub upserts: UpsertStats,
}

impl<P: Pipeline, S: TournamentStore> ConsolidationEngine<P, S> {
    pub fn new(pipeline: P, store: S) -> Self {
        Self { pipeline, store }
    }

    pub async fn run(&self, documents: Vec<ScrapedDocument>) -> Result<RunReport> {
        self.run_with_cancel(documents, &CancelToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        documents: Vec<ScrapedDocument>,
        cancel: &CancelToken,
    ) -> Result<RunReport> {
        tracing::info!("Starting consolidation run over {} documents", documents.len());

        let output = self.pipeline.run(documents, cancel).await?;
        log_summary(&output.summary);

        let upserts = self
            .store
            .upsert_batch(&output.records)
            .await
            .map_err(|e| EtlError::StorageHandoffError {
                message: e.to_string(),
            })?;

        tracing::info!(
            "Stored final set: {} inserted, {} updated",
            upserts.inserted,
            upserts.updated
        );

        Ok(RunReport {
            summary: output.summary,
            upserts,
        })
    }
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        "Run summary: {} documents in, {} extracted, {} duplicates merged, {} final",
        summary.documents_in,
        summary.extracted,
        summary.duplicates_merged,
        summary.final_count
    );
    for reason in [
        RejectReason::InvalidSport,
        RejectReason::InvalidLevel,
        RejectReason::MissingName,
        RejectReason::LowConfidence,
        RejectReason::ExtractionServiceError,
    ] {
        let count = summary.rejections(reason);
        if count > 0 {
            tracing::info!("Rejected ({}): {}", reason, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{TournamentQuery, TournamentRecord};
    use crate::domain::ports::PipelineOutput;
    use async_trait::async_trait;

    struct FixedPipeline {
        output: PipelineOutput,
    }

    #[async_trait]
    impl Pipeline for FixedPipeline {
        async fn run(
            &self,
            _documents: Vec<ScrapedDocument>,
            _cancel: &CancelToken,
        ) -> Result<PipelineOutput> {
            Ok(self.output.clone())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl TournamentStore for FailingStore {
        async fn upsert_batch(&self, _records: &[TournamentRecord]) -> Result<UpsertStats> {
            Err(EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }

        async fn query(&self, _query: &TournamentQuery) -> Result<Vec<TournamentRecord>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal_storage_handoff() {
        let pipeline = FixedPipeline {
            output: PipelineOutput {
                records: vec![],
                summary: RunSummary::default(),
            },
        };
        let engine = ConsolidationEngine::new(pipeline, FailingStore);
        let result = engine.run(vec![]).await;
        assert!(matches!(
            result,
            Err(EtlError::StorageHandoffError { .. })
        ));
    }
}
