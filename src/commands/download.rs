//! Download command - pre-populate problem test-case caches

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::error;

use crate::judge::problem::ProblemError;
use crate::judge::{problem_from_url, TestcaseCache};
use crate::models::VerificationInput;

/// Fetch system test cases for every problem named by the input file
/// and/or listed explicitly. Failures are reported per URL and do not
/// stop the remaining downloads.
pub fn execute(verify_json: Option<&Path>, urls: &[String]) -> Result<bool> {
    let mut wanted: BTreeSet<String> = urls.iter().cloned().collect();
    if let Some(path) = verify_json {
        let input = VerificationInput::from_file(path)?;
        for file in input.files.values() {
            for directive in &file.verification {
                if let Some(url) = directive.problem_url() {
                    wanted.insert(url.to_string());
                }
            }
        }
    }

    let cache = TestcaseCache::from_env();
    let mut failures = 0;
    for url in &wanted {
        let outcome = match problem_from_url(url) {
            Some(problem) => problem.download_system_cases(&cache),
            None => Err(ProblemError::UnsupportedUrl(url.clone()).into()),
        };
        match outcome {
            Ok(()) => println!("{} {url}", "✓".green().bold()),
            Err(err) => {
                error!(%url, %err, "download failed");
                println!("{} {url}", "✗".red().bold());
                failures += 1;
            }
        }
    }
    Ok(failures == 0)
}
