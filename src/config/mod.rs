pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tourney-etl")]
#[command(about = "Consolidates scraped sports-tournament pages into structured records")]
pub struct CliConfig {
    /// JSON file with the batch of scraped documents to process
    #[arg(long)]
    pub input: String,

    /// Extraction-service endpoint
    #[arg(long, default_value = "http://localhost:8080/extract")]
    pub endpoint: String,

    /// Directory for the tournament store
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "5")]
    pub concurrent_requests: usize,

    /// Retries per document after the first failed extraction call
    #[arg(long, default_value = "2")]
    pub max_retries: u32,

    /// Acceptance threshold for extraction confidence
    #[arg(long, default_value = "0.7")]
    pub min_confidence: f64,

    #[arg(long, default_value = "30")]
    pub timeout_seconds: u64,

    /// Optional TOML configuration file; overrides the flags above
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of the compact console format
    #[arg(long)]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn service_endpoint(&self) -> &str {
        &self.endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("input", &self.input)?;
        validate_url("endpoint", &self.endpoint)?;
        validate_non_empty_string("output_path", &self.output_path)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        validate_range("concurrent_requests", self.concurrent_requests, 1, 100)?;
        validate_range("min_confidence", self.min_confidence, 0.0, 1.0)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CliConfig {
        CliConfig {
            input: "scraped.json".to_string(),
            endpoint: "https://extract.example.com".to_string(),
            output_path: "./output".to_string(),
            concurrent_requests: 5,
            max_retries: 2,
            min_confidence: 0.7,
            timeout_seconds: 30,
            config: None,
            verbose: false,
            json_logs: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_bad_endpoint_fails() {
        let mut c = config();
        c.endpoint = "not a url".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_fails() {
        let mut c = config();
        c.min_confidence = 1.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_json_logs_flag_parses() {
        let c = CliConfig::try_parse_from(["tourney-etl", "--input", "scraped.json", "--json-logs"])
            .unwrap();
        assert!(c.json_logs);

        let c = CliConfig::try_parse_from(["tourney-etl", "--input", "scraped.json"]).unwrap();
        assert!(!c.json_logs);
    }

    #[test]
    fn test_zero_workers_fails() {
        let mut c = config();
        c.concurrent_requests = 0;
        assert!(c.validate().is_err());
    }
}
