// Adapters layer: concrete implementations of the extraction-service and
// storage ports.

pub mod http_extractor;
pub mod json_store;
pub mod memory_store;

use crate::core::dates;
use crate::domain::model::{TournamentQuery, TournamentRecord, UpsertStats};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Natural-key upsert shared by the store backends. On a key match the
/// higher-confidence record's fields win, the surrogate id and created_at of
/// the existing row are kept, and source provenance is unioned either way.
pub(crate) fn upsert_into(
    records: &mut Vec<TournamentRecord>,
    next_id: &mut u64,
    incoming: &[TournamentRecord],
) -> UpsertStats {
    let mut stats = UpsertStats::default();

    for record in incoming {
        let key = record.natural_key();
        match records.iter_mut().find(|r| r.natural_key() == key) {
            Some(existing) => {
                let sources: BTreeSet<String> = existing
                    .sources
                    .iter()
                    .chain(record.sources.iter())
                    .cloned()
                    .collect();
                if record.confidence_score > existing.confidence_score {
                    let id = existing.id;
                    let created_at = existing.created_at;
                    *existing = record.clone();
                    existing.id = id;
                    existing.created_at = created_at;
                }
                existing.sources = sources.into_iter().collect();
                stats.updated += 1;
            }
            None => {
                let mut record = record.clone();
                record.id = Some(*next_id);
                *next_id += 1;
                records.push(record);
                stats.inserted += 1;
            }
        }
    }

    stats
}

/// Query filtering shared by the store backends. Past/future classification
/// is recomputed against `today`, not against what was true at extraction
/// time; records without a parseable event date stay visible in current
/// views.
pub(crate) fn filter_query(
    records: &[TournamentRecord],
    query: &TournamentQuery,
    today: NaiveDate,
) -> Vec<TournamentRecord> {
    let mut matched: Vec<TournamentRecord> = records
        .iter()
        .filter(|r| query.sport.map_or(true, |s| r.sport == s))
        .filter(|r| query.level.map_or(true, |l| r.level == l))
        .filter(|r| {
            query
                .min_confidence
                .map_or(true, |floor| r.confidence_score >= floor)
        })
        .filter(|r| {
            query.include_past
                || !r
                    .normalized_event_date
                    .map(|d| dates::is_past(d, today))
                    .unwrap_or(false)
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        b.confidence_score
            .partial_cmp(&a.confidence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.created_at.cmp(&a.created_at))
    });

    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}
