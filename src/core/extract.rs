use crate::domain::model::{ScrapedDocument, TournamentCandidate};
use crate::domain::ports::{ExtractionRequest, ExtractionService, RawExtraction};
use crate::utils::error::ExtractError;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Free-text values the extraction service emits when a field is unknown.
const PLACEHOLDER_VALUES: &[&str] = &["n/a", "not available", "not specified", "none", "unknown"];

/// Maximum stored length for any single extracted text field.
const MAX_FIELD_LEN: usize = 500;

/// Wraps the extraction-service port with the per-document retry policy and
/// turns raw responses into candidates.
///
/// Service failures are retried with exponential backoff up to the configured
/// budget, then surfaced to the caller as a permanent skip for that document.
/// A successful response missing any of the required fields (name, sport,
/// level) yields no candidate at all rather than a partially populated one.
pub struct FieldExtractor<E: ExtractionService> {
    service: Arc<E>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl<E: ExtractionService> FieldExtractor<E> {
    pub fn new(service: Arc<E>, max_retries: u32) -> Self {
        Self {
            service,
            max_retries,
            initial_backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub async fn extract(
        &self,
        document: &ScrapedDocument,
    ) -> Result<Option<TournamentCandidate>, ExtractError> {
        let raw = self.call_with_retry(document).await?;
        Ok(self.build_candidate(raw, document))
    }

    async fn call_with_retry(
        &self,
        document: &ScrapedDocument,
    ) -> Result<RawExtraction, ExtractError> {
        let mut attempt = 0;
        loop {
            let request = ExtractionRequest::for_document(document);
            match self.service.extract(request).await {
                Ok(raw) => return Ok(raw),
                Err(err) if attempt < self.max_retries => {
                    let delay = self.initial_backoff * 2u32.pow(attempt);
                    tracing::warn!(
                        "Extraction attempt {}/{} failed for {}: {} (retrying in {:?})",
                        attempt + 1,
                        self.max_retries + 1,
                        document.source_url,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        "Extraction failed permanently for {} after {} attempts: {}",
                        document.source_url,
                        attempt + 1,
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    fn build_candidate(
        &self,
        raw: RawExtraction,
        document: &ScrapedDocument,
    ) -> Option<TournamentCandidate> {
        let name = clean_field(raw.name)?;
        let sport = clean_field(raw.sport)?;
        let level = clean_field(raw.level)?;

        let confidence_score = raw.confidence_score.unwrap_or(0.0).clamp(0.0, 1.0);

        Some(TournamentCandidate {
            name,
            sport,
            level,
            date_info: clean_list(raw.date_info),
            registration_deadline: clean_field(raw.registration_deadline),
            venue: clean_list(raw.venue),
            summary: clean_field(raw.summary).unwrap_or_default(),
            confidence_score,
            source_url: document.source_url.clone(),
        })
    }
}

/// Trim, drop placeholder values, and cap field length. `None` means the
/// field is absent, not empty-string-populated.
fn clean_field(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    Some(trimmed.chars().take(MAX_FIELD_LEN).collect())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter_map(|v| clean_field(Some(v))).collect()
}
