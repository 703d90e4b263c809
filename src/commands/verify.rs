//! Verify command - run the pending verifications and write a result file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use crate::git;
use crate::judge::TestcaseCache;
use crate::models::{VerificationInput, VerifyCommandResult};
use crate::timestamp::{FsTimestamp, GitTimestamp, TimestampSource};
use crate::verify::{SplitState, Verifier, VerifyOptions};

use super::check;

pub struct VerifyArgs {
    pub input: PathBuf,
    /// Wall-clock budget in seconds for the whole batch.
    pub timeout: Option<f64>,
    /// Per-testcase time limit when a directive names none.
    pub tle: f64,
    /// Memory limit in megabytes when a directive names none.
    pub mle: Option<f64>,
    pub prev_result: Option<PathBuf>,
    pub split: Option<usize>,
    pub split_index: Option<usize>,
    pub output: PathBuf,
    pub download: bool,
}

/// Execute the verify command. The result file is written even when the
/// batch timed out or tests failed, so shard merging always has input.
pub fn execute(args: VerifyArgs) -> Result<bool> {
    let input = VerificationInput::from_file(&args.input)?;
    let prev_result = args
        .prev_result
        .as_deref()
        .map(VerifyCommandResult::from_file)
        .transpose()?;
    let split_state = SplitState::from_options(args.split, args.split_index)?;

    // Git commit times inside a repository (stable across CI checkouts),
    // filesystem mtimes elsewhere.
    let timestamps: Box<dyn TimestampSource> = match git::root_directory() {
        Ok(root) => {
            info!(root = %root.display(), "using git commit times");
            Box::new(GitTimestamp)
        }
        Err(_) => {
            info!("not a git repository, using filesystem mtimes");
            Box::new(FsTimestamp)
        }
    };

    let verifier = Verifier::new(
        input,
        timestamps,
        TestcaseCache::from_env(),
        VerifyOptions {
            prev_result,
            split_state,
            timeout: args.timeout,
            default_tle: args.tle,
            default_mle: args.mle,
            download: args.download,
        },
    );

    let result = verifier.verify()?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    result.save_file(&args.output)?;
    println!(
        "{} Result written to {}",
        "→".cyan().bold(),
        args.output.display()
    );

    check::print_summary(&result);
    Ok(result.is_success(true))
}
