use crate::domain::model::{NormalizedCandidate, TournamentRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Merge accepted, normalized candidates that refer to the same real-world
/// tournament.
///
/// Two candidates are duplicates when their sport and level match and their
/// names are equal after case-insensitive whitespace normalization, or when
/// their normalized event dates match exactly and their venue lists share an
/// entry. Groups are formed as connected components of that relation, so the
/// outcome does not depend on arrival order.
///
/// Merge policy per group: the highest-confidence candidate is the base
/// record (ties go to the earliest-seen by document order); source URLs are
/// unioned into a sorted provenance list; a missing registration deadline on
/// the base is filled from the best donor that has one.
pub fn dedup(candidates: &[NormalizedCandidate], created_at: DateTime<Utc>) -> Vec<TournamentRecord> {
    let n = candidates.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if is_duplicate(&candidates[i], &candidates[j]) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut root_to_group: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let root = find(&mut parent, i);
        match root_to_group[root] {
            Some(g) => groups[g].push(i),
            None => {
                root_to_group[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }

    let mut merged: Vec<(usize, TournamentRecord)> = groups
        .into_iter()
        .map(|group| merge_group(candidates, &group, created_at))
        .collect();

    merged.sort_by_key(|(base_seq, _)| *base_seq);
    merged.into_iter().map(|(_, record)| record).collect()
}

fn is_duplicate(a: &NormalizedCandidate, b: &NormalizedCandidate) -> bool {
    let same_identity = a.sport == b.sport
        && a.level == b.level
        && normalize_name(&a.candidate.name) == normalize_name(&b.candidate.name);
    if same_identity {
        return true;
    }

    match (a.normalized_event_date, b.normalized_event_date) {
        (Some(da), Some(db)) if da == db => shares_venue(&a.candidate.venue, &b.candidate.venue),
        _ => false,
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn shares_venue(a: &[String], b: &[String]) -> bool {
    a.iter().any(|va| {
        let va = va.trim().to_lowercase();
        !va.is_empty() && b.iter().any(|vb| vb.trim().to_lowercase() == va)
    })
}

/// Higher confidence wins; equal confidence falls back to the earliest-seen
/// candidate. Deterministic for any iteration order over the group.
fn better(candidates: &[NormalizedCandidate], a: usize, b: usize) -> usize {
    let (ca, cb) = (&candidates[a], &candidates[b]);
    match ca
        .candidate
        .confidence_score
        .partial_cmp(&cb.candidate.confidence_score)
    {
        Some(std::cmp::Ordering::Greater) => a,
        Some(std::cmp::Ordering::Less) => b,
        _ => {
            if ca.seq <= cb.seq {
                a
            } else {
                b
            }
        }
    }
}

fn has_deadline(c: &NormalizedCandidate) -> bool {
    c.candidate
        .registration_deadline
        .as_deref()
        .map(str::trim)
        .is_some_and(|d| !d.is_empty())
}

fn merge_group(
    candidates: &[NormalizedCandidate],
    group: &[usize],
    created_at: DateTime<Utc>,
) -> (usize, TournamentRecord) {
    let base_idx = group
        .iter()
        .copied()
        .reduce(|best, i| better(candidates, best, i))
        .unwrap_or(group[0]);
    let base = &candidates[base_idx];

    let sources: BTreeSet<String> = group
        .iter()
        .map(|&i| candidates[i].candidate.source_url.clone())
        .filter(|s| !s.is_empty())
        .collect();

    let (deadline, deadline_date) = if has_deadline(base) {
        (
            base.candidate.registration_deadline.clone(),
            base.normalized_deadline_date,
        )
    } else {
        group
            .iter()
            .copied()
            .filter(|&i| has_deadline(&candidates[i]))
            .reduce(|best, i| better(candidates, best, i))
            .map(|donor| {
                (
                    candidates[donor].candidate.registration_deadline.clone(),
                    candidates[donor].normalized_deadline_date,
                )
            })
            .unwrap_or((None, None))
    };

    let record = TournamentRecord {
        id: None,
        name: base.candidate.name.clone(),
        sport: base.sport,
        level: base.level,
        date_info: base.candidate.date_info.clone(),
        registration_deadline: deadline,
        venue: base.candidate.venue.clone(),
        summary: base.candidate.summary.clone(),
        confidence_score: base.candidate.confidence_score,
        sources: sources.into_iter().collect(),
        normalized_event_date: base.normalized_event_date,
        normalized_deadline_date: deadline_date,
        is_past: base.is_past,
        created_at,
    };

    (base.seq, record)
}

fn find(parent: &mut Vec<usize>, i: usize) -> usize {
    if parent[i] != i {
        let root = find(parent, parent[i]);
        parent[i] = root;
    }
    parent[i]
}

fn union(parent: &mut Vec<usize>, a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}
