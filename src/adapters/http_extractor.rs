use crate::domain::ports::{ExtractionRequest, ExtractionService, RawExtraction};
use crate::utils::error::{ExtractError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTP adapter for the extraction-service boundary.
///
/// Posts the request contract as JSON and decodes the populated schema from
/// the response body. Text-understanding backends tend to wrap their JSON in
/// markdown fences or prose, so the body is scrubbed before decoding instead
/// of being trusted as clean JSON.
pub struct HttpExtractionService {
    client: Client,
    endpoint: String,
}

impl HttpExtractionService {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> std::result::Result<RawExtraction, ExtractError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ExtractError::QuotaExceeded);
        }
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_transport)?;
        parse_extraction_body(&body)
    }
}

fn classify_transport(err: reqwest::Error) -> ExtractError {
    if err.is_timeout() || err.is_connect() {
        ExtractError::Timeout
    } else {
        ExtractError::Transport(err)
    }
}

fn parse_extraction_body(body: &str) -> std::result::Result<RawExtraction, ExtractError> {
    let cleaned = strip_code_fences(body);
    let slice = locate_json_object(cleaned).unwrap_or(cleaned);
    serde_json::from_str(slice).map_err(|e| ExtractError::MalformedResponse(e.to_string()))
}

fn strip_code_fences(body: &str) -> &str {
    let trimmed = body.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Slice out the outermost JSON object when the body carries surrounding
/// prose.
fn locate_json_object(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end > start {
        Some(&body[start..=end])
    } else {
        None
    }
}
