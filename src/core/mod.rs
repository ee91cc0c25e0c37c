pub mod dates;
pub mod dedup;
pub mod engine;
pub mod extract;
pub mod pipeline;
pub mod validate;

pub use crate::domain::model::{
    RunSummary, ScrapedDocument, TournamentCandidate, TournamentRecord,
};
pub use crate::domain::ports::{
    CancelToken, ConfigProvider, ExtractionService, Pipeline, TournamentStore,
};
pub use crate::utils::error::Result;
