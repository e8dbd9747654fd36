//! Heuristic source credibility and date plausibility checks.
//!
//! Tier collaborators may use these to fill in `credibility_score` before
//! handing an attempt back; the engine itself never calls out to verify
//! anything.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::source::Source;

/// Earliest year accepted by [`validate_historical_date`].
pub const EARLIEST_PLAUSIBLE_YEAR: i32 = -3000;

const HIGH_CREDIBILITY_DOMAINS: &[&str] =
    &["wikipedia.org", "britannica.com", "jstor.org", "archive.org"];

const HIGH_CREDIBILITY_SUFFIXES: &[&str] = &["edu", "gov"];

static LEADING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d{1,6})(?:\D|$)").expect("invalid regex"));

fn is_high_credibility_host(host: &str) -> bool {
    let matches = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

    HIGH_CREDIBILITY_DOMAINS.iter().any(|d| matches(d))
        || HIGH_CREDIBILITY_SUFFIXES.iter().any(|d| matches(d))
}

/// Score a source's credibility from its host and metadata.
///
/// Base 0.5; +0.2 for a well-known reference host or an `.edu`/`.gov`
/// domain; +0.1 each for an author, a publisher and an access date.
/// Capped at 1.0.
pub fn assess_credibility(source: &Source) -> f64 {
    // whole tenths, so a fully credited source lands on exactly 1.0
    let mut tenths: u32 = 5;

    if source.domain().is_some_and(is_high_credibility_host) {
        tenths += 2;
    }
    if source.author.is_some() {
        tenths += 1;
    }
    if source.publisher.is_some() {
        tenths += 1;
    }
    if source.accessed_date.is_some() {
        tenths += 1;
    }

    f64::from(tenths.min(10)) / 10.0
}

/// Whether `date` starts with a plausible historical year.
///
/// Accepts `YYYY`, `YYYY-MM-DD` and negative (BCE) years like `-44-03-15`.
/// The year must fall within `-3000..=today.year()`.
pub fn validate_historical_date(date: &str, today: NaiveDate) -> bool {
    let Some(year) = LEADING_YEAR
        .captures(date)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
    else {
        return false;
    };

    (EARLIEST_PLAUSIBLE_YEAR..=today.year()).contains(&year)
}
