//! Merge-result command - fold shard outputs into one result file

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::VerifyCommandResult;

/// Fold the given result files left to right and emit the merged result
/// (to `output` when given, stdout otherwise).
pub fn execute(result_paths: &[PathBuf], output: Option<&Path>) -> Result<bool> {
    let mut merged = VerifyCommandResult::default();
    for path in result_paths {
        merged = merged.merge(VerifyCommandResult::from_file(path)?);
    }
    info!(
        inputs = result_paths.len(),
        files = merged.files.len(),
        "merged results"
    );

    match output {
        Some(path) => merged.save_file(path)?,
        None => {
            let json =
                serde_json::to_string(&merged).context("Failed to serialize merged result")?;
            println!("{json}");
        }
    }
    Ok(true)
}
