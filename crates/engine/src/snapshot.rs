//! One-shot baseline population: hash every file under the configured
//! folders and probe every port not already baselined. Re-runnable without
//! duplicating rows; never updates an already-baselined item.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use baseline_sqlite::Db;
use port_probe::SweepOptions;
use tracing::{info, warn};

pub struct BaselineOptions {
    /// Ordered folders to walk for supervised files.
    pub folders: Vec<PathBuf>,
    /// Ports eligible for supervision; defaults to the full 1..=65535 space.
    pub ports: Vec<u16>,
    pub sweep: SweepOptions,
}

impl BaselineOptions {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        BaselineOptions {
            folders,
            ports: hostguard_core::full_port_range(),
            sweep: SweepOptions::default(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineSummary {
    pub files_seen: u64,
    pub files_added: u64,
    pub files_skipped: u64,
    pub ports_probed: u64,
    pub ports_added: u64,
}

pub async fn build_baseline(db: &Db, opts: &BaselineOptions) -> Result<BaselineSummary> {
    let mut summary = BaselineSummary::default();

    for folder in &opts.folders {
        let files = file_hash::walk_regular_files(folder);
        let tx = db.conn.unchecked_transaction()?;
        for path in files {
            summary.files_seen += 1;
            match file_hash::hash_file(&path) {
                Ok(digest) => {
                    if db.upsert_file_if_absent(&path.to_string_lossy(), &digest)? {
                        summary.files_added += 1;
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping file");
                    summary.files_skipped += 1;
                }
            }
        }
        tx.commit()?;
        info!(folder = %folder.display(), "folder baselined");
    }

    let existing: HashSet<u16> = db
        .list_supervised_ports()?
        .iter()
        .map(|p| p.port_number)
        .collect();
    let targets: Vec<u16> = opts
        .ports
        .iter()
        .copied()
        .filter(|p| !existing.contains(p))
        .collect();
    if !targets.is_empty() {
        info!(ports = targets.len(), "probing unbaselined ports");
        match port_probe::sweep(&targets, &opts.sweep).await {
            Ok(observations) => {
                summary.ports_probed = observations.len() as u64;
                let tx = db.conn.unchecked_transaction()?;
                for ob in observations {
                    if db.upsert_port_if_absent(ob.port, ob.state, ob.is_listening)? {
                        summary.ports_added += 1;
                    }
                }
                tx.commit()?;
            }
            Err(e) => warn!(error = %e, "socket table unavailable, port baseline skipped"),
        }
    }

    Ok(summary)
}
