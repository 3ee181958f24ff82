//! Core domain logic for the screen-time analyzer.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: turning raw text exports into timestamped usage snapshots
//! - Reconstruction: diffing cumulative snapshots into usage intervals
//!
//! Nothing in this crate touches storage; the persistence layer feeds it
//! ordered snapshot data and writes back the intervals it computes.

pub mod duration;
pub mod parse;
pub mod rebuild;

pub use duration::parse_duration;
pub use parse::{Snapshot, SnapshotParser, parse_header, parse_snapshots};
pub use rebuild::{UsageInterval, diff_snapshots};
