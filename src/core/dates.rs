use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Year-less dates further than this in the past are rolled into next year,
/// so announcements straddling a year boundary resolve forward.
const YEARLESS_GRACE_DAYS: i64 = 30;

fn dmy_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)\.?,?\s*(\d{4})?$")
            .unwrap()
    })
}

fn mdy_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s*(\d{4})?$").unwrap()
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})$").unwrap())
}

/// Placeholder phrases the source pages use instead of a date. These are not
/// parse failures worth flagging; the tournament is simply undated and is
/// treated as current/future downstream.
pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    ["tbd", "to be decided", "coming soon", "upcoming"]
        .iter()
        .any(|p| t.contains(p))
}

/// Parse a free-text date expression into a calendar date.
///
/// Candidate formats are tried in a fixed priority order: day-month-year,
/// month-day-year, ISO, then relative phrases. The first successful parse
/// wins; there is no further disambiguation. Returns `None` when no confident
/// parse exists.
pub fn normalize(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean(text);
    if cleaned.is_empty() || is_placeholder(&cleaned) {
        return None;
    }

    parse_day_month_year(&cleaned, today)
        .or_else(|| parse_month_day_year(&cleaned, today))
        .or_else(|| parse_iso(&cleaned))
        .or_else(|| parse_relative(&cleaned, today))
}

/// First parseable entry of an ordered date-text sequence.
pub fn normalize_first(texts: &[String], today: NaiveDate) -> Option<NaiveDate> {
    texts.iter().find_map(|t| normalize(t, today))
}

/// Pure past/current classification against the evaluation-time date. A date
/// equal to `today` is current, not past.
pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

fn clean(text: &str) -> String {
    let trimmed = text.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_day_month_year(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = dmy_text_re().captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());
        return resolve(day, month, year, today);
    }

    if let Some(caps) = numeric_re().captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_month_day_year(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = mdy_text_re().captures(text) {
        let month = month_from_name(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|m| m.as_str().parse::<i32>().ok());
        return resolve(day, month, year, today);
    }

    if let Some(caps) = numeric_re().captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    match text.to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "next week" => Some(today + Duration::days(7)),
        "next month" => add_months(today, 1),
        _ => None,
    }
}

/// A date missing its year belongs to the current year, unless that would put
/// it more than 30 days in the past; then it is next year's announcement.
fn resolve(day: u32, month: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if today - this_year > Duration::days(YEARLESS_GRACE_DAYS) {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

fn expand_year(raw: i32) -> i32 {
    if raw < 100 {
        2000 + raw
    } else {
        raw
    }
}

fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = add_month_first(first)?;
    Some((next - first).num_days() as u32)
}

fn add_month_first(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
