pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http_extractor::HttpExtractionService;
pub use adapters::json_store::JsonFileStore;
pub use adapters::memory_store::MemoryStore;
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::engine::{ConsolidationEngine, RunReport};
pub use core::extract::FieldExtractor;
pub use core::pipeline::ConsolidationPipeline;
pub use utils::error::{EtlError, ExtractError, Result};
