use crate::domain::model::{Level, RejectReason, Sport, TournamentCandidate};

/// Default acceptance threshold for extraction confidence.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

/// Accept/reject decision for one candidate. Checks run in a fixed order and
/// short-circuit on the first failure; accepted candidates pass through
/// unchanged, with their sport/level resolved into the closed sets.
pub fn validate(
    candidate: &TournamentCandidate,
    min_confidence: f64,
) -> Result<(Sport, Level), RejectReason> {
    let sport = Sport::parse(&candidate.sport).ok_or(RejectReason::InvalidSport)?;
    let level = Level::parse(&candidate.level).ok_or(RejectReason::InvalidLevel)?;

    if candidate.name.trim().is_empty() {
        return Err(RejectReason::MissingName);
    }

    if candidate.confidence_score < min_confidence {
        return Err(RejectReason::LowConfidence);
    }

    Ok((sport, level))
}
