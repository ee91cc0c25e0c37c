use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// TOML-file alternative to the CLI flags, for runs wired into schedulers.
///
/// ```toml
/// [pipeline]
/// name = "weekly-consolidation"
///
/// [extract]
/// endpoint = "https://extract.example.com/v1"
/// concurrent_requests = 8
/// max_retries = 3
///
/// [load]
/// output_path = "/var/lib/tourney"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineSection,
    pub extract: ExtractSection,
    pub load: LoadSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractSection {
    pub endpoint: String,
    pub concurrent_requests: Option<usize>,
    pub max_retries: Option<u32>,
    pub min_confidence: Option<f64>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    pub output_path: String,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content).map_err(|e| EtlError::ConfigError {
            message: format!("Failed to parse TOML config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigProvider for TomlConfig {
    fn service_endpoint(&self) -> &str {
        &self.extract.endpoint
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.extract.concurrent_requests.unwrap_or(5)
    }

    fn max_retries(&self) -> u32 {
        self.extract.max_retries.unwrap_or(2)
    }

    fn min_confidence(&self) -> f64 {
        self.extract.min_confidence.unwrap_or(0.7)
    }

    fn timeout_seconds(&self) -> u64 {
        self.extract.timeout_seconds.unwrap_or(30)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.pipeline.name.trim().is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "pipeline.name".to_string(),
            });
        }
        validate_url("extract.endpoint", &self.extract.endpoint)?;
        if let Some(concurrent) = self.extract.concurrent_requests {
            validate_range("extract.concurrent_requests", concurrent, 1, 100)?;
        }
        if let Some(threshold) = self.extract.min_confidence {
            validate_range("extract.min_confidence", threshold, 0.0, 1.0)?;
        }
        if self.load.output_path.trim().is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "load.output_path".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[pipeline]
name = "weekly-consolidation"
description = "Weekly tournament sweep"

[extract]
endpoint = "https://extract.example.com/v1"
concurrent_requests = 1
min_confidence = 0.8

[load]
output_path = "./store"
"#;

    #[test]
    fn test_parses_sample() {
        let config = TomlConfig::from_str(SAMPLE).unwrap();
        assert_eq!(config.pipeline.name, "weekly-consolidation");
        assert_eq!(config.concurrent_requests(), 1);
        assert_eq!(config.min_confidence(), 0.8);
        // Unset values fall back to defaults.
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.timeout_seconds(), 30);
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let broken = SAMPLE.replace("https://extract.example.com/v1", "nope");
        assert!(TomlConfig::from_str(&broken).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let broken = SAMPLE.replace("min_confidence = 0.8", "min_confidence = 8.0");
        assert!(TomlConfig::from_str(&broken).is_err());
    }

    #[test]
    fn test_rejects_missing_section() {
        assert!(TomlConfig::from_str("[pipeline]\nname = \"x\"").is_err());
    }
}
