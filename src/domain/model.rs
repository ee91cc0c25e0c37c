use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One scraped page, as delivered by the scraping collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub source_url: String,
    pub raw_text: String,
    pub fetched_at: DateTime<Utc>,
}

/// The closed set of sports covered by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sport {
    Cricket,
    Football,
    Badminton,
    Running,
    Gym,
    Cycling,
    Swimming,
    Kabaddi,
    Yoga,
    Basketball,
    Chess,
    #[serde(rename = "Table Tennis")]
    TableTennis,
}

impl Sport {
    pub const ALL: [Sport; 12] = [
        Sport::Cricket,
        Sport::Football,
        Sport::Badminton,
        Sport::Running,
        Sport::Gym,
        Sport::Cycling,
        Sport::Swimming,
        Sport::Kabaddi,
        Sport::Yoga,
        Sport::Basketball,
        Sport::Chess,
        Sport::TableTennis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cricket => "Cricket",
            Sport::Football => "Football",
            Sport::Badminton => "Badminton",
            Sport::Running => "Running",
            Sport::Gym => "Gym",
            Sport::Cycling => "Cycling",
            Sport::Swimming => "Swimming",
            Sport::Kabaddi => "Kabaddi",
            Sport::Yoga => "Yoga",
            Sport::Basketball => "Basketball",
            Sport::Chess => "Chess",
            Sport::TableTennis => "Table Tennis",
        }
    }

    /// Set-membership parse against the canonical list. Case-insensitive and
    /// whitespace-trimmed; anything else is not a member.
    pub fn parse(value: &str) -> Option<Sport> {
        let needle = value.trim();
        Sport::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of competition levels, including the local-tournament tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Corporate,
    School,
    #[serde(rename = "College/University")]
    CollegeUniversity,
    #[serde(rename = "Club/Academy")]
    ClubAcademy,
    District,
    State,
    #[serde(rename = "Zonal/Regional")]
    ZonalRegional,
    National,
    International,
    Local,
    Community,
    Residential,
    Municipal,
    City,
    #[serde(rename = "Inter-Club")]
    InterClub,
    #[serde(rename = "Inter-School")]
    InterSchool,
    #[serde(rename = "Inter-College")]
    InterCollege,
    Neighborhood,
    Society,
}

impl Level {
    pub const ALL: [Level; 19] = [
        Level::Corporate,
        Level::School,
        Level::CollegeUniversity,
        Level::ClubAcademy,
        Level::District,
        Level::State,
        Level::ZonalRegional,
        Level::National,
        Level::International,
        Level::Local,
        Level::Community,
        Level::Residential,
        Level::Municipal,
        Level::City,
        Level::InterClub,
        Level::InterSchool,
        Level::InterCollege,
        Level::Neighborhood,
        Level::Society,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Corporate => "Corporate",
            Level::School => "School",
            Level::CollegeUniversity => "College/University",
            Level::ClubAcademy => "Club/Academy",
            Level::District => "District",
            Level::State => "State",
            Level::ZonalRegional => "Zonal/Regional",
            Level::National => "National",
            Level::International => "International",
            Level::Local => "Local",
            Level::Community => "Community",
            Level::Residential => "Residential",
            Level::Municipal => "Municipal",
            Level::City => "City",
            Level::InterClub => "Inter-Club",
            Level::InterSchool => "Inter-School",
            Level::InterCollege => "Inter-College",
            Level::Neighborhood => "Neighborhood",
            Level::Society => "Society",
        }
    }

    pub fn parse(value: &str) -> Option<Level> {
        let needle = value.trim();
        Level::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated extraction result for one scraped document.
///
/// `sport` and `level` are carried exactly as the extraction service returned
/// them; turning them into members of the closed sets (or rejecting them) is
/// the validator's job, never a silent coercion here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentCandidate {
    pub name: String,
    pub sport: String,
    pub level: String,
    #[serde(default)]
    pub date_info: Vec<String>,
    #[serde(default)]
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub venue: Vec<String>,
    #[serde(default)]
    pub summary: String,
    pub confidence_score: f64,
    pub source_url: String,
}

/// An accepted candidate annotated with its calendar dates.
///
/// `seq` is the candidate's position in document order; it is assigned before
/// any concurrent work starts and is the deterministic tie-break during
/// deduplication.
#[derive(Debug, Clone)]
pub struct NormalizedCandidate {
    pub candidate: TournamentCandidate,
    pub sport: Sport,
    pub level: Level,
    pub normalized_event_date: Option<NaiveDate>,
    pub normalized_deadline_date: Option<NaiveDate>,
    pub is_past: bool,
    pub seq: usize,
}

/// The persisted shape handed to the storage collaborator. The surrogate `id`
/// is assigned by the store, not by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub sport: Sport,
    pub level: Level,
    pub date_info: Vec<String>,
    pub registration_deadline: Option<String>,
    pub venue: Vec<String>,
    pub summary: String,
    pub confidence_score: f64,
    pub sources: Vec<String>,
    pub normalized_event_date: Option<NaiveDate>,
    pub normalized_deadline_date: Option<NaiveDate>,
    pub is_past: bool,
    pub created_at: DateTime<Utc>,
}

impl TournamentRecord {
    /// Storage-level identity: (normalized name, sport, level, event date).
    pub fn natural_key(&self) -> (String, Sport, Level, Option<NaiveDate>) {
        (
            self.name.trim().to_lowercase(),
            self.sport,
            self.level,
            self.normalized_event_date,
        )
    }
}

/// Why a candidate (or a whole document) never reached persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidSport,
    InvalidLevel,
    MissingName,
    LowConfidence,
    /// Extraction-service failures that exhausted the retry budget. Counted in
    /// the run summary alongside validation rejections; never returned by the
    /// validator itself.
    ExtractionServiceError,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::InvalidSport => "InvalidSport",
            RejectReason::InvalidLevel => "InvalidLevel",
            RejectReason::MissingName => "MissingName",
            RejectReason::LowConfidence => "LowConfidence",
            RejectReason::ExtractionServiceError => "ExtractionServiceError",
        };
        f.write_str(s)
    }
}

/// Per-run operational report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub documents_in: usize,
    pub extracted: usize,
    pub rejected_by_reason: BTreeMap<RejectReason, usize>,
    pub duplicates_merged: usize,
    pub final_count: usize,
}

impl RunSummary {
    pub fn count_rejection(&mut self, reason: RejectReason) {
        *self.rejected_by_reason.entry(reason).or_insert(0) += 1;
    }

    pub fn rejections(&self, reason: RejectReason) -> usize {
        self.rejected_by_reason.get(&reason).copied().unwrap_or(0)
    }
}

/// Stages of one consolidation run. The pipeline advances over the whole
/// batch before crossing a stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Extracting,
    Validating,
    Normalizing,
    Deduplicating,
    Complete,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::Idle => "idle",
            RunStage::Extracting => "extracting",
            RunStage::Validating => "validating",
            RunStage::Normalizing => "normalizing",
            RunStage::Deduplicating => "deduplicating",
            RunStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Filter parameters for store reads, consumed by the downstream read API.
#[derive(Debug, Clone, Default)]
pub struct TournamentQuery {
    pub sport: Option<Sport>,
    pub level: Option<Level>,
    pub min_confidence: Option<f64>,
    pub include_past: bool,
    pub limit: Option<usize>,
}

/// Outcome of one upsert-batch hand-off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
}
