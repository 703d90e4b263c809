//! Merge-input command - fold scanner outputs into one input file

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::VerificationInput;

/// Fold the given input files left to right and emit the merged input
/// (to `output` when given, stdout otherwise). Later files win per path.
pub fn execute(input_paths: &[PathBuf], output: Option<&Path>) -> Result<bool> {
    let mut merged = VerificationInput::default();
    for path in input_paths {
        merged = merged.merge(VerificationInput::from_file(path)?);
    }
    info!(
        inputs = input_paths.len(),
        files = merged.files.len(),
        "merged inputs"
    );

    match output {
        Some(path) => merged.save_file(path)?,
        None => {
            let json =
                serde_json::to_string(&merged).context("Failed to serialize merged input")?;
            println!("{json}");
        }
    }
    Ok(true)
}
