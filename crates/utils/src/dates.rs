//! Loose date parsing for portfolio entries.
//!
//! Portfolio dates are free-form strings typed by hand ("07/2025", "2019",
//! "Summer 2021", "2024-03"). They only ever need to be ordered, so every
//! accepted form is folded into a single sortable integer `YYYY * 100 + MM`.
//! A bare year has month `0`, which places it after every dated month of the
//! same year when sorting newest first.

use std::{cmp::Ordering, sync::LazyLock};

use regex::Regex;

static MONTH_SLASH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{4})\b").expect("valid regex"));
static YEAR_DASH_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})\b").expect("valid regex"));
static MONTH_NAME_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b")
        .expect("valid regex")
});
static BARE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid regex"));

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parses a portfolio date into `YYYY * 100 + MM`.
///
/// Forms are tried in order: `MM/YYYY`, `YYYY-MM`, `<Month> YYYY`, then a
/// bare `YYYY`. Each may appear anywhere inside surrounding text. A form that
/// carries an out-of-range month rejects the whole input instead of falling
/// through to the bare-year form.
pub fn parse_year_month(input: &str) -> Option<i32> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(caps) = MONTH_SLASH_YEAR.captures(input) {
        let month: i32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        return combine(year, month);
    }

    if let Some(caps) = YEAR_DASH_MONTH.captures(input) {
        let year: i32 = caps[1].parse().ok()?;
        let month: i32 = caps[2].parse().ok()?;
        return combine(year, month);
    }

    if let Some(caps) = MONTH_NAME_YEAR.captures(input) {
        let prefix = caps[1].to_ascii_lowercase();
        let month = MONTH_ABBREVIATIONS.iter().position(|m| *m == prefix)? as i32 + 1;
        let year: i32 = caps[2].parse().ok()?;
        return combine(year, month);
    }

    BARE_YEAR
        .captures(input)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .map(|year| year * 100)
}

fn combine(year: i32, month: i32) -> Option<i32> {
    (1..=12).contains(&month).then_some(year * 100 + month)
}

/// Orders two optional portfolio dates newest first.
///
/// Undated entries (missing or unparseable) always sort after dated ones and
/// compare equal to each other, so a stable sort keeps their input order.
pub fn compare_projects_by_date_desc(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.and_then(parse_year_month);
    let b = b.and_then(parse_year_month);
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
