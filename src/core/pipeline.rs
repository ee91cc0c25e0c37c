use crate::core::dedup::dedup;
use crate::core::dates;
use crate::core::extract::FieldExtractor;
use crate::core::validate;
use crate::domain::model::{
    Level, NormalizedCandidate, RejectReason, RunStage, RunSummary, ScrapedDocument, Sport,
    TournamentCandidate,
};
use crate::domain::ports::{CancelToken, ExtractionService, Pipeline, PipelineOutput};
use crate::utils::error::{EtlError, Result};
use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Staged consolidation over one batch of scraped documents.
///
/// The batch moves through extraction, validation, normalization, and
/// deduplication as a whole; nothing is handed downstream until the final set
/// is fully merged. Extraction fans out to bounded concurrent workers since
/// each call is an independent service round-trip; every later stage is a
/// single-threaded in-memory pass over the surviving candidates.
pub struct ConsolidationPipeline<E: ExtractionService + 'static> {
    extractor: Arc<FieldExtractor<E>>,
    concurrent_requests: usize,
    min_confidence: f64,
    today: Option<NaiveDate>,
}

impl<E: ExtractionService + 'static> ConsolidationPipeline<E> {
    pub fn new(
        extractor: FieldExtractor<E>,
        concurrent_requests: usize,
        min_confidence: f64,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            concurrent_requests: concurrent_requests.max(1),
            min_confidence,
            today: None,
        }
    }

    /// Pin the evaluation date. Tests use this; production runs classify
    /// past/future against the local date at run time.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn enter_stage(&self, stage: RunStage, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(EtlError::Cancelled {
                stage: stage.to_string(),
            });
        }
        tracing::info!("Run stage: {}", stage);
        Ok(())
    }

    async fn extract_stage(
        &self,
        documents: Vec<ScrapedDocument>,
        summary: &mut RunSummary,
    ) -> Result<Vec<TournamentCandidate>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrent_requests));
        let mut workers = JoinSet::new();

        for (idx, document) in documents.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| EtlError::ProcessingError {
                    message: format!("extraction scheduler stopped: {}", e),
                })?;
            let extractor = Arc::clone(&self.extractor);
            workers.spawn(async move {
                let outcome = extractor.extract(&document).await;
                drop(permit);
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<TournamentCandidate>> = Vec::new();
        let mut outcomes = Vec::new();
        while let Some(joined) = workers.join_next().await {
            let (idx, outcome) = joined.map_err(|e| EtlError::ProcessingError {
                message: format!("extraction worker failed: {}", e),
            })?;
            outcomes.push((idx, outcome));
        }
        // Restore document order so downstream tie-breaks are deterministic.
        outcomes.sort_by_key(|(idx, _)| *idx);

        for (_, outcome) in outcomes {
            match outcome {
                Ok(Some(candidate)) => slots.push(Some(candidate)),
                Ok(None) => {
                    tracing::debug!("Document produced no usable candidate");
                    slots.push(None);
                }
                Err(err) => {
                    tracing::warn!("Document skipped after retry budget: {}", err);
                    summary.count_rejection(RejectReason::ExtractionServiceError);
                    slots.push(None);
                }
            }
        }

        let candidates: Vec<TournamentCandidate> = slots.into_iter().flatten().collect();
        summary.extracted = candidates.len();
        Ok(candidates)
    }

    fn validate_stage(
        &self,
        candidates: Vec<TournamentCandidate>,
        summary: &mut RunSummary,
    ) -> Vec<(TournamentCandidate, Sport, Level)> {
        let mut accepted = Vec::new();
        for candidate in candidates {
            match validate::validate(&candidate, self.min_confidence) {
                Ok((sport, level)) => accepted.push((candidate, sport, level)),
                Err(reason) => {
                    tracing::debug!("Rejected '{}': {}", candidate.name, reason);
                    summary.count_rejection(reason);
                }
            }
        }
        accepted
    }

    fn normalize_stage(
        &self,
        accepted: Vec<(TournamentCandidate, Sport, Level)>,
    ) -> Vec<NormalizedCandidate> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        accepted
            .into_iter()
            .enumerate()
            .map(|(seq, (candidate, sport, level))| {
                let normalized_event_date = dates::normalize_first(&candidate.date_info, today);
                let normalized_deadline_date = candidate
                    .registration_deadline
                    .as_deref()
                    .and_then(|d| dates::normalize(d, today));
                // Unknown event dates classify as current, never past.
                let is_past = normalized_event_date
                    .map(|d| dates::is_past(d, today))
                    .unwrap_or(false);
                NormalizedCandidate {
                    candidate,
                    sport,
                    level,
                    normalized_event_date,
                    normalized_deadline_date,
                    is_past,
                    seq,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<E: ExtractionService + 'static> Pipeline for ConsolidationPipeline<E> {
    async fn run(
        &self,
        documents: Vec<ScrapedDocument>,
        cancel: &CancelToken,
    ) -> Result<PipelineOutput> {
        let mut summary = RunSummary {
            documents_in: documents.len(),
            ..Default::default()
        };

        self.enter_stage(RunStage::Extracting, cancel)?;
        let candidates = self.extract_stage(documents, &mut summary).await?;
        tracing::info!("Extracted {} candidates", summary.extracted);

        self.enter_stage(RunStage::Validating, cancel)?;
        let accepted = self.validate_stage(candidates, &mut summary);
        tracing::info!("Accepted {} candidates", accepted.len());

        self.enter_stage(RunStage::Normalizing, cancel)?;
        let normalized = self.normalize_stage(accepted);

        self.enter_stage(RunStage::Deduplicating, cancel)?;
        let records = dedup(&normalized, Utc::now());
        summary.duplicates_merged = normalized.len() - records.len();
        summary.final_count = records.len();

        self.enter_stage(RunStage::Complete, cancel)?;
        Ok(PipelineOutput { records, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::DEFAULT_MAX_RETRIES;
    use crate::domain::model::Sport;
    use crate::domain::ports::{ExtractionRequest, RawExtraction};
    use crate::utils::error::ExtractError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Responds per source URL: a fixed extraction, a permanent failure, or
    /// an empty (unusable) response.
    struct RoutedService {
        routes: HashMap<String, RawExtraction>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl ExtractionService for RoutedService {
        async fn extract(
            &self,
            request: ExtractionRequest,
        ) -> std::result::Result<RawExtraction, ExtractError> {
            if self.failing.contains(&request.source_url) {
                return Err(ExtractError::Timeout);
            }
            Ok(self
                .routes
                .get(&request.source_url)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn document(url: &str) -> ScrapedDocument {
        ScrapedDocument {
            source_url: url.to_string(),
            raw_text: format!("content of {}", url),
            fetched_at: Utc::now(),
        }
    }

    fn extraction(name: &str, sport: &str, confidence: f64, date: &str) -> RawExtraction {
        RawExtraction {
            name: Some(name.to_string()),
            sport: Some(sport.to_string()),
            level: Some("School".to_string()),
            date_info: vec![date.to_string()],
            registration_deadline: None,
            venue: vec!["Main Ground".to_string()],
            summary: Some(format!("{} summary", name)),
            confidence_score: Some(confidence),
        }
    }

    fn pipeline(service: RoutedService) -> ConsolidationPipeline<RoutedService> {
        let extractor = FieldExtractor::new(Arc::new(service), DEFAULT_MAX_RETRIES)
            .with_backoff(Duration::from_millis(1));
        ConsolidationPipeline::new(extractor, 4, 0.7)
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[tokio::test]
    async fn test_full_run_counts_every_outcome() {
        let mut routes = HashMap::new();
        routes.insert(
            "https://a".to_string(),
            extraction("City Cup", "Football", 0.8, "2025-07-01"),
        );
        routes.insert(
            "https://b".to_string(),
            extraction("City Cup", "Football", 0.9, "2025-07-01"),
        );
        routes.insert(
            "https://c".to_string(),
            extraction("Chess Open", "Quidditch", 0.9, "2025-07-01"),
        );
        routes.insert(
            "https://d".to_string(),
            extraction("Faint Signal", "Cricket", 0.5, "2025-07-01"),
        );
        let service = RoutedService {
            routes,
            failing: vec!["https://e".to_string()],
        };

        let documents = vec![
            document("https://a"),
            document("https://b"),
            document("https://c"),
            document("https://d"),
            document("https://e"),
        ];

        let output = pipeline(service)
            .run(documents, &CancelToken::new())
            .await
            .unwrap();

        let summary = &output.summary;
        assert_eq!(summary.documents_in, 5);
        assert_eq!(summary.extracted, 4);
        assert_eq!(summary.rejections(RejectReason::InvalidSport), 1);
        assert_eq!(summary.rejections(RejectReason::LowConfidence), 1);
        assert_eq!(summary.rejections(RejectReason::ExtractionServiceError), 1);
        assert_eq!(summary.duplicates_merged, 1);
        assert_eq!(summary.final_count, 1);

        let record = &output.records[0];
        assert_eq!(record.name, "City Cup");
        assert_eq!(record.confidence_score, 0.9);
        assert_eq!(record.sources.len(), 2);
        assert!(!record.is_past);
    }

    #[tokio::test]
    async fn test_extraction_failure_does_not_halt_the_batch() {
        let mut routes = HashMap::new();
        routes.insert(
            "https://good".to_string(),
            extraction("River Run", "Running", 0.9, "2025-08-01"),
        );
        let service = RoutedService {
            routes,
            failing: vec!["https://broken".to_string()],
        };

        let output = pipeline(service)
            .run(
                vec![document("https://broken"), document("https://good")],
                &CancelToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].sport, Sport::Running);
        assert_eq!(
            output.summary.rejections(RejectReason::ExtractionServiceError),
            1
        );
    }

    #[tokio::test]
    async fn test_past_classification_uses_pinned_today() {
        let mut routes = HashMap::new();
        routes.insert(
            "https://past".to_string(),
            extraction("Spring Meet", "Swimming", 0.9, "2025-05-01"),
        );
        routes.insert(
            "https://future".to_string(),
            extraction("Autumn Meet", "Swimming", 0.9, "2025-07-01"),
        );
        let service = RoutedService {
            routes,
            failing: vec![],
        };

        let output = pipeline(service)
            .run(
                vec![document("https://past"), document("https://future")],
                &CancelToken::new(),
            )
            .await
            .unwrap();

        let by_name: HashMap<_, _> = output
            .records
            .iter()
            .map(|r| (r.name.clone(), r.is_past))
            .collect();
        assert_eq!(by_name["Spring Meet"], true);
        assert_eq!(by_name["Autumn Meet"], false);
    }

    #[tokio::test]
    async fn test_unusable_document_yields_no_candidate_and_no_rejection() {
        // The routed default is an all-empty extraction: required fields
        // missing, so the document is silently dropped.
        let service = RoutedService {
            routes: HashMap::new(),
            failing: vec![],
        };

        let output = pipeline(service)
            .run(vec![document("https://empty")], &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(output.summary.documents_in, 1);
        assert_eq!(output.summary.extracted, 0);
        assert!(output.summary.rejected_by_reason.is_empty());
        assert_eq!(output.summary.final_count, 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_at_stage_boundary() {
        let service = RoutedService {
            routes: HashMap::new(),
            failing: vec![],
        };
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = pipeline(service)
            .run(vec![document("https://a")], &cancel)
            .await;

        match result {
            Err(EtlError::Cancelled { stage }) => assert_eq!(stage, "extracting"),
            other => panic!("expected cancellation, got {:?}", other.map(|o| o.summary)),
        }
    }

    #[tokio::test]
    async fn test_unparseable_event_date_is_kept_but_not_past() {
        let mut routes = HashMap::new();
        routes.insert(
            "https://vague".to_string(),
            extraction("Mystery Cup", "Chess", 0.9, "sometime in the monsoon"),
        );
        let service = RoutedService {
            routes,
            failing: vec![],
        };

        let output = pipeline(service)
            .run(vec![document("https://vague")], &CancelToken::new())
            .await
            .unwrap();

        let record = &output.records[0];
        assert_eq!(record.normalized_event_date, None);
        assert!(!record.is_past);
    }
}
