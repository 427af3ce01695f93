//! Snapshot and diff engine: builds the host baseline and generates drift
//! reports against it. Baseline rows are anchored to the first snapshot;
//! every diff compares against that original value, and drift history
//! accumulates solely in the per-report modification tables.

pub mod diff;
pub mod snapshot;

pub use diff::{generate_report, DiffOutcome};
pub use snapshot::{build_baseline, BaselineOptions, BaselineSummary};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new())
}
