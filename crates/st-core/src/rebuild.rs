//! Interval reconstruction from cumulative snapshots.
//!
//! Each device exports cumulative per-app counters that (usually) only grow
//! within a calendar day and reset at midnight. Diffing consecutive
//! snapshots recovers discrete usage intervals. The diffing is pure: the
//! storage layer feeds it the complete time-ordered snapshot list for one
//! device and persists whatever comes back, replacing prior output.

use chrono::{NaiveDateTime, NaiveTime};

use crate::parse::Snapshot;

/// A reconstructed slice of real usage attributed to one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub app: String,
    /// Counter delta over the interval. May be less than `end - start` when
    /// several apps share the same wall-clock span.
    pub seconds: i64,
}

/// Diffs a time-ordered snapshot list into usage intervals.
///
/// The first snapshot never emits an interval: it has no prior baseline, and
/// fabricating usage for time the system has no evidence about is avoided.
/// For each later snapshot, the baseline is the previous snapshot when both
/// fall on the same calendar day; on a day change the counters are assumed
/// to have reset, so the baseline is empty and the interval is anchored at
/// midnight of the later day.
///
/// Deterministic: the same snapshot list always produces the same interval
/// list, in the same order.
pub fn diff_snapshots(snapshots: &[Snapshot]) -> Vec<UsageInterval> {
    let mut intervals = Vec::new();

    for (prev, curr) in snapshots.iter().zip(snapshots.iter().skip(1)) {
        let same_day = prev.timestamp.date() == curr.timestamp.date();
        let start = if same_day {
            prev.timestamp
        } else {
            curr.timestamp.date().and_time(NaiveTime::MIN)
        };

        if start >= curr.timestamp {
            // A snapshot taken exactly at midnight on a new day would yield
            // zero-width intervals; every stored interval must satisfy
            // end > start.
            tracing::debug!(timestamp = %curr.timestamp, "skipping zero-width span");
            continue;
        }

        for (app, &curr_seconds) in &curr.apps {
            let baseline = if same_day {
                prev.apps.get(app).copied().unwrap_or(0)
            } else {
                0
            };
            let delta = curr_seconds - baseline;

            if delta > 0 {
                intervals.push(UsageInterval {
                    start,
                    end: curr.timestamp,
                    app: app.clone(),
                    seconds: delta,
                });
            } else if delta < 0 {
                // Counter moved backward mid-day: manual history deletion or
                // an off-schedule reset. The entry is dropped; the rest of
                // the snapshot still contributes.
                tracing::warn!(app = %app, delta, "cumulative counter moved backward; dropping entry");
            }
        }
    }

    intervals
}
