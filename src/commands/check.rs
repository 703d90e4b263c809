//! Check command - report pass/fail over one or more result files

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::models::{ResultStatus, VerifyCommandResult};

/// Merge the given result files and print a status histogram.
///
/// Returns `true` iff no verification failed; skipped runs do not count
/// against the verdict.
pub fn execute(result_paths: &[PathBuf]) -> Result<bool> {
    let mut merged = VerifyCommandResult::default();
    for path in result_paths {
        merged = merged.merge(VerifyCommandResult::from_file(path)?);
    }

    print_summary(&merged);
    Ok(merged.is_success(true))
}

/// Histogram of every individual verification result, then a verdict
/// line. Printed to stderr so stdout stays free for result JSON.
pub fn print_summary(result: &VerifyCommandResult) {
    let counts = result.status_counts();
    for status in ResultStatus::ALL {
        let count = counts.get(&status).copied().unwrap_or(0);
        let count = match status {
            ResultStatus::Success => count.to_string().green(),
            ResultStatus::Failure if count > 0 => count.to_string().red().bold(),
            ResultStatus::Failure => count.to_string().normal(),
            ResultStatus::Skipped => count.to_string().yellow(),
        };
        eprintln!("{:>8}: {}", status.to_string(), count);
    }

    let failures = counts.get(&ResultStatus::Failure).copied().unwrap_or(0);
    if failures == 0 {
        eprintln!("{} All verifications passed", "✓".green().bold());
    } else {
        eprintln!("{} {} verification(s) failed", "✗".red().bold(), failures);
    }
}
