use hostguard_core::PortState;
use serde::{Deserialize, Serialize};

pub type ReportId = i64;

/// A file registered for drift detection. `hash` is the digest recorded at
/// first snapshot; it is never rewritten, so every later diff compares
/// against the original baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisedFile {
    pub path: String,
    pub hash: String,
}

/// A TCP port registered for drift detection, with the connect state and
/// listening flag observed at first snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisedPort {
    pub port_number: u16,
    pub state: PortState,
    pub is_listening: bool,
}

/// One diff run. Opened with empty result/description, finalized once the
/// run's comparisons are committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: ReportId,
    pub date: String,
    pub result: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModification {
    pub file_modification_id: i64,
    pub report_id: ReportId,
    pub path: String,
    pub file_modification_date: String,
    pub old_hash: String,
    pub new_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortModification {
    pub port_modification_id: i64,
    pub report_id: ReportId,
    pub port_number: u16,
    pub port_modification_date: String,
    pub old_state: PortState,
    pub new_state: PortState,
    pub old_is_listening: bool,
    pub new_is_listening: bool,
}

/// Verdict stored in `reports.result` when a run closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportResult {
    ChangesDetected,
    NoChanges,
}

impl ReportResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportResult::ChangesDetected => "Changes detected",
            ReportResult::NoChanges => "No Changes",
        }
    }
}
