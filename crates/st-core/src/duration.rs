//! Free-text duration parsing.
//!
//! Converts human-readable composite durations like `"1h 30m"`, `"45 min"`,
//! or `"2h"` into a total number of seconds. Each unit token contributes
//! independently; absent units contribute zero.

use std::sync::LazyLock;

use regex::Regex;

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*h").unwrap());
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:m|min)").unwrap());
static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*(?:s|sec)").unwrap());

/// Parses a composite duration string into total seconds.
///
/// Unknown text around the unit tokens is ignored, so a string with no
/// recognizable units parses to `0`.
pub fn parse_duration(input: &str) -> i64 {
    let input = input.to_lowercase();
    let mut total = 0;

    if let Some(captures) = HOURS_RE.captures(&input) {
        total += captures[1].parse::<i64>().unwrap_or(0) * 3600;
    }
    if let Some(captures) = MINUTES_RE.captures(&input) {
        total += captures[1].parse::<i64>().unwrap_or(0) * 60;
    }
    if let Some(captures) = SECONDS_RE.captures(&input) {
        total += captures[1].parse::<i64>().unwrap_or(0);
    }

    total
}
