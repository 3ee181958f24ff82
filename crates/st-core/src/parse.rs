//! Snapshot parsing for raw usage exports.
//!
//! An export is a text document containing zero or more blocks, each
//! introduced by a date-header line and followed by comma-separated two-line
//! entries (an app title line, then a raw-seconds duration line). The exports
//! are produced by a mobile shortcut and pasted or synced by hand, so the
//! parser tolerates markdown preamble, invisible Unicode noise, and partially
//! garbled entries: anything unparsable is skipped with a log line, never an
//! error.

use std::collections::BTreeMap;
use std::str::Lines;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Header formats tried in order; the first match wins.
///
/// Covers the shortcut's default locale output ("13 Feb 2026 at 2:00 PM"),
/// its 24-hour variant, and plain ISO 8601.
const HEADER_FORMATS: &[&str] = &[
    "%d %b %Y at %I:%M %p",
    "%d %B %Y at %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Matches a trailing parenthesized qualifier on an app title line,
/// e.g. `"Safari (com.apple.mobilesafari)"`.
static TRAILING_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*)\s*\(.*\)$").unwrap());

/// One parsed export block: cumulative per-app seconds at a single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    /// Cumulative seconds per app. Ordered so that downstream iteration is
    /// deterministic.
    pub apps: BTreeMap<String, i64>,
}

/// Attempts to parse a line as a snapshot date header.
///
/// Mobile-OS copy/paste injects narrow no-break spaces (U+202F) and other
/// non-ASCII bytes into time strings; those are stripped before matching.
/// Returns `None` for lines that match none of the known formats, which the
/// parser treats as body text.
pub fn parse_header(line: &str) -> Option<NaiveDateTime> {
    let cleaned: String = line
        .replace('\u{202f}', " ")
        .chars()
        .filter(char::is_ascii)
        .collect();
    let cleaned = cleaned.trim();

    HEADER_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(cleaned, format).ok())
}

/// Parses raw export text into a sequence of snapshots.
///
/// The returned iterator makes a single pass over the input, yielding
/// snapshots in the order their headers appear. Lines before the first
/// header are discarded as document preamble, and a block whose entries all
/// fail to parse yields nothing rather than an empty snapshot.
pub fn parse_snapshots(text: &str) -> SnapshotParser<'_> {
    SnapshotParser {
        lines: text.lines(),
        current: None,
    }
}

/// Single-pass iterator over the snapshots in an export document.
#[derive(Debug)]
pub struct SnapshotParser<'a> {
    lines: Lines<'a>,
    current: Option<(NaiveDateTime, Vec<&'a str>)>,
}

impl Iterator for SnapshotParser<'_> {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        loop {
            let Some(raw) = self.lines.next() else {
                // End of input: the trailing block closes here.
                let (timestamp, block) = self.current.take()?;
                let apps = parse_block(&block);
                if apps.is_empty() {
                    return None;
                }
                return Some(Snapshot { timestamp, apps });
            };

            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(timestamp) = parse_header(line) {
                let closed = self.current.replace((timestamp, Vec::new()));
                if let Some((prev_timestamp, block)) = closed {
                    let apps = parse_block(&block);
                    if !apps.is_empty() {
                        return Some(Snapshot {
                            timestamp: prev_timestamp,
                            apps,
                        });
                    }
                }
            } else if let Some((_, block)) = self.current.as_mut() {
                block.push(line);
            } else {
                tracing::debug!(line, "ignoring preamble line before first header");
            }
        }
    }
}

/// Parses the body lines of one block into `{app → cumulative seconds}`.
///
/// Entries are separated by commas and span two physical lines each: a title
/// line and a duration line. Entries missing a duration line or carrying an
/// unparsable duration are skipped.
fn parse_block(lines: &[&str]) -> BTreeMap<String, i64> {
    let body = lines.join("\n");
    let mut apps = BTreeMap::new();

    for entry in body.split(',') {
        let parts: Vec<&str> = entry
            .lines()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let [title, duration, ..] = parts.as_slice() else {
            if let [title] = parts.as_slice() {
                tracing::debug!(title, "skipping entry without a duration line");
            }
            continue;
        };

        let app = TRAILING_PARENS
            .captures(title)
            .and_then(|captures| captures.get(1))
            .map_or(*title, |group| group.as_str())
            .trim();

        let Some(seconds) = parse_seconds_line(duration) else {
            tracing::debug!(line = duration, "skipping entry with unparsable duration");
            continue;
        };

        apps.insert(app.to_string(), seconds);
    }

    apps
}

/// Parses a raw-seconds duration line like `"754 sec"` or `"12.5sec"`.
///
/// The value is truncated to whole seconds.
fn parse_seconds_line(line: &str) -> Option<i64> {
    let cleaned: String = line
        .to_lowercase()
        .replace("sec", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let seconds = cleaned.parse::<f64>().ok()?;
    Some(seconds.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn header_parses_12_hour_format() {
        assert_eq!(
            parse_header("13 Feb 2026 at 2:00 PM"),
            Some(ts(2026, 2, 13, 14, 0, 0))
        );
    }

    #[test]
    fn header_parses_despite_narrow_no_break_space() {
        // Same instant with U+202F injected before "PM", as iOS pastes it.
        assert_eq!(
            parse_header("13 Feb 2026 at 2:00\u{202f}PM"),
            parse_header("13 Feb 2026 at 2:00 PM")
        );
    }

    #[test]
    fn header_parses_24_hour_format() {
        assert_eq!(
            parse_header("13 February 2026 at 14:00"),
            Some(ts(2026, 2, 13, 14, 0, 0))
        );
    }

    #[test]
    fn header_parses_iso_format() {
        assert_eq!(
            parse_header("2026-02-13 14:00:00"),
            Some(ts(2026, 2, 13, 14, 0, 0))
        );
    }

    #[test]
    fn header_rejects_body_text() {
        assert_eq!(parse_header("Safari (web browser)"), None);
        assert_eq!(parse_header("754 sec"), None);
        assert_eq!(parse_header("# Screen Time"), None);
    }

    #[test]
    fn parses_single_snapshot() {
        let text = "\
13 Feb 2026 at 2:00 PM
Safari (web browser)
754 sec,
Mail
120 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].timestamp, ts(2026, 2, 13, 14, 0, 0));
        assert_eq!(snapshots[0].apps.get("Safari"), Some(&754));
        assert_eq!(snapshots[0].apps.get("Mail"), Some(&120));
    }

    #[test]
    fn parses_multiple_snapshots_in_order() {
        let text = "\
13 Feb 2026 at 2:00 PM
Safari
100 sec
13 Feb 2026 at 3:00 PM
Safari
250 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].timestamp, ts(2026, 2, 13, 14, 0, 0));
        assert_eq!(snapshots[1].timestamp, ts(2026, 2, 13, 15, 0, 0));
        assert_eq!(snapshots[1].apps.get("Safari"), Some(&250));
    }

    #[test]
    fn preamble_before_first_header_is_discarded() {
        let text = "\
# Exported screen time
some note

13 Feb 2026 at 2:00 PM
Safari
100 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].apps.len(), 1);
    }

    #[test]
    fn unparsable_duration_skips_entry_not_block() {
        let text = "\
13 Feb 2026 at 2:00 PM
Safari
garbled,
Mail
120 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].apps.get("Safari"), None);
        assert_eq!(snapshots[0].apps.get("Mail"), Some(&120));
    }

    #[test]
    fn block_with_no_valid_entries_yields_no_snapshot() {
        let text = "\
13 Feb 2026 at 2:00 PM
just some text without durations
13 Feb 2026 at 3:00 PM
Safari
100 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].timestamp, ts(2026, 2, 13, 15, 0, 0));
    }

    #[test]
    fn fractional_seconds_truncate() {
        let text = "\
13 Feb 2026 at 2:00 PM
Safari
754.9 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots[0].apps.get("Safari"), Some(&754));
    }

    #[test]
    fn duration_line_tolerates_no_break_space() {
        let text = "\
13 Feb 2026 at 2:00 PM
Safari
1\u{202f}754 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots[0].apps.get("Safari"), Some(&1754));
    }

    #[test]
    fn trailing_qualifier_stripped_from_app_name() {
        let text = "\
13 Feb 2026 at 2:00 PM
YouTube (entertainment)
300 sec";
        let snapshots: Vec<Snapshot> = parse_snapshots(text).collect();
        assert_eq!(snapshots[0].apps.get("YouTube"), Some(&300));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parse_snapshots("").count(), 0);
        assert_eq!(parse_snapshots("no headers here\nat all").count(), 0);
    }
}
