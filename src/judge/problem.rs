//! Problem capability: obtain system test cases for a judge URL
//!
//! Judge-site fetchers are external collaborators. The implementations
//! here serve cases from a local directory (`file://` URLs) or from the
//! shared on-disk cache, delegating first-time downloads to an external
//! fetcher command when one is configured.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

use crate::exec;
use crate::models::ShellCommand;

use super::cache::{SystemTestCase, TestcaseCache};

/// Environment variable naming an external fetcher command, invoked as
/// `<fetcher> <url> <directory>` to populate a cache directory.
pub const DOWNLOADER_ENV: &str = "CP_VERIFY_DOWNLOADER";

#[cfg(windows)]
const CHECKER_NAME: &str = "checker.exe";
#[cfg(not(windows))]
const CHECKER_NAME: &str = "checker";

/// Test-case acquisition failures. All of these surface as a `FAILURE`
/// verification result for the affected file, never as a batch abort.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("unsupported problem URL: {0}")]
    UnsupportedUrl(String),
    #[error("no test cases available for {0}")]
    NoTestCases(String),
    #[error("test-case fetcher failed for {0}")]
    FetcherFailed(String),
    #[error("test cases for {0} are not cached and ${DOWNLOADER_ENV} is not set")]
    FetcherNotConfigured(String),
}

/// One judge problem's test-case capability.
pub trait Problem {
    fn url(&self) -> &str;

    /// Ensure system cases are available, populating the cache if needed.
    /// Must tolerate an already-populated directory (concurrent shards may
    /// race on first download).
    fn download_system_cases(&self, cache: &TestcaseCache) -> Result<()>;

    /// Enumerate the system cases, sorted by name.
    fn system_cases(&self, cache: &TestcaseCache) -> Result<Vec<SystemTestCase>>;

    /// Custom output-comparator binary, when the problem ships one.
    fn checker_path(&self, cache: &TestcaseCache) -> Option<PathBuf> {
        let _ = cache;
        None
    }
}

/// Resolve a problem URL against the registered implementations, tried
/// in order. Returns `None` for URLs no implementation recognizes.
pub fn problem_from_url(url: &str) -> Option<Box<dyn Problem>> {
    if let Some(local) = LocalProblem::from_url(url) {
        return Some(Box::new(local));
    }
    if let Some(cached) = CachedProblem::from_url(url) {
        return Some(Box::new(cached));
    }
    None
}

/// Problem backed by a plain directory of cases (`file://` URLs).
///
/// Used for repository-local test data; bypasses the cache entirely.
#[derive(Debug, Clone)]
pub struct LocalProblem {
    url: String,
    directory: PathBuf,
}

impl LocalProblem {
    pub fn from_url(url: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| Regex::new(r"^file://(.+)$").unwrap());
        let captures = pattern.captures(url)?;
        Some(LocalProblem {
            url: url.to_string(),
            directory: PathBuf::from(&captures[1]),
        })
    }
}

impl Problem for LocalProblem {
    fn url(&self) -> &str {
        &self.url
    }

    fn download_system_cases(&self, _cache: &TestcaseCache) -> Result<()> {
        if !TestcaseCache::is_populated(&self.directory) {
            bail!(
                "local problem directory has no test cases: {}",
                self.directory.display()
            );
        }
        Ok(())
    }

    fn system_cases(&self, _cache: &TestcaseCache) -> Result<Vec<SystemTestCase>> {
        TestcaseCache::list_cases(&self.directory)
    }

    fn checker_path(&self, _cache: &TestcaseCache) -> Option<PathBuf> {
        let checker = self.directory.join(CHECKER_NAME);
        checker.is_file().then_some(checker)
    }
}

/// Problem served from the shared cache, populated by an external fetcher.
#[derive(Debug, Clone)]
pub struct CachedProblem {
    url: String,
}

impl CachedProblem {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Some(CachedProblem {
                url: url.to_string(),
            });
        }
        None
    }
}

impl Problem for CachedProblem {
    fn url(&self) -> &str {
        &self.url
    }

    fn download_system_cases(&self, cache: &TestcaseCache) -> Result<()> {
        let dir = cache.problem_dir(&self.url);
        if TestcaseCache::is_populated(&dir) {
            info!(url = %self.url, "test cases already cached");
            return Ok(());
        }

        let Some(downloader) = std::env::var_os(DOWNLOADER_ENV) else {
            return Err(ProblemError::FetcherNotConfigured(self.url.clone()).into());
        };

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        info!(url = %self.url, dir = %dir.display(), "fetching test cases");
        let command = ShellCommand::argv(vec![
            downloader.to_string_lossy().into_owned(),
            self.url.clone(),
            dir.to_string_lossy().into_owned(),
        ]);
        let status = exec::run_status(&command)?;
        if !status.success() {
            return Err(ProblemError::FetcherFailed(self.url.clone()).into());
        }
        if !TestcaseCache::is_populated(&dir) {
            return Err(ProblemError::NoTestCases(self.url.clone()).into());
        }
        Ok(())
    }

    fn system_cases(&self, cache: &TestcaseCache) -> Result<Vec<SystemTestCase>> {
        let dir = cache.problem_dir(&self.url);
        let cases = TestcaseCache::list_cases(&dir)?;
        if cases.is_empty() {
            return Err(ProblemError::NoTestCases(self.url.clone()).into());
        }
        Ok(cases)
    }

    fn checker_path(&self, cache: &TestcaseCache) -> Option<PathBuf> {
        let checker = cache.problem_dir(&self.url).join(CHECKER_NAME);
        checker.is_file().then_some(checker)
    }
}
