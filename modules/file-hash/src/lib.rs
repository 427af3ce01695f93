//! Content hashing probe: streaming SHA-256 digests and the recursive
//! walk that feeds the baseline.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use hostguard_core::ProbeError;
use sha2::{Digest, Sha256};
use tracing::warn;
use walkdir::WalkDir;

const CHUNK: usize = 8192;

/// Hash the full binary content of a file, returning the lowercase hex
/// SHA-256 digest. Deterministic in the content; no side effects beyond
/// the read.
pub fn hash_file(path: &Path) -> Result<String, ProbeError> {
    let f = File::open(path).map_err(|e| ProbeError::file_read(path, e))?;
    let meta = f.metadata().map_err(|e| ProbeError::file_read(path, e))?;
    if meta.is_dir() {
        return Err(ProbeError::file_read(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
        ));
    }
    let mut reader = BufReader::new(f);
    let mut sha = Sha256::new();
    let mut buf = [0u8; CHUNK];
    loop {
        let n = reader.read(&mut buf).map_err(|e| ProbeError::file_read(path, e))?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }
    Ok(hex::encode(sha.finalize()))
}

/// Recursively enumerate every regular file under `root`. Symlinks are not
/// followed; unreadable subtrees are logged and skipped rather than
/// aborting the walk.
pub fn walk_regular_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        warn!(path = %root.display(), "supervised folder does not exist, skipping");
        return Vec::new();
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "unreadable entry during walk, skipping");
            }
        }
    }
    files
}
