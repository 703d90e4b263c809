//! Timestamp strategies for the staleness check
//!
//! A file's effective modification time is taken over its whole transitive
//! dependency set, from one of two sources chosen once at run start: git
//! commit times (CI) or filesystem mtimes (local runs). Both are truncated
//! to whole seconds so the two modes stay comparable.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::git;

/// Source of "when did any of these files last change".
pub trait TimestampSource {
    fn timestamp(&self, paths: &BTreeSet<PathBuf>) -> Result<DateTime<Utc>>;
}

/// Most recent commit touching any of the paths.
pub struct GitTimestamp;

impl TimestampSource for GitTimestamp {
    fn timestamp(&self, paths: &BTreeSet<PathBuf>) -> Result<DateTime<Utc>> {
        git::commit_time(paths)
    }
}

/// Maximum filesystem mtime among the paths that exist on disk.
///
/// Sub-second precision is discarded because git commit times lack it.
pub struct FsTimestamp;

impl TimestampSource for FsTimestamp {
    fn timestamp(&self, paths: &BTreeSet<PathBuf>) -> Result<DateTime<Utc>> {
        let mut newest = DateTime::<Utc>::MIN_UTC;
        for path in paths {
            let Ok(metadata) = std::fs::metadata(path) else {
                continue;
            };
            let Ok(mtime) = metadata.modified() else {
                continue;
            };
            let secs = mtime
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            if let Some(t) = Utc.timestamp_opt(secs, 0).single() {
                newest = newest.max(t);
            }
        }
        Ok(newest)
    }
}
