//! On-disk test-case cache shared by shard processes
//!
//! Each problem gets `<root>/problems/<key>/` where `key` is derived from
//! the problem URL. Cases live as `in/<name>.in` + `out/<name>.out` pairs.
//! Shards may race to populate the same directory; population is
//! check-before-populate and a half-written directory simply fails the
//! non-emptiness check and is redone.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// An (input, expected-output) pair fetched for one problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseData {
    pub name: String,
    pub input: Vec<u8>,
    pub output: Vec<u8>,
}

/// A test case resident on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestCase {
    pub name: String,
    pub input_path: PathBuf,
    /// Absent for checker-judged problems that ship no expected output.
    pub output_path: Option<PathBuf>,
}

/// Cache-directory key for a problem URL.
pub fn url_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Root of the per-problem test-case cache.
#[derive(Debug, Clone)]
pub struct TestcaseCache {
    root: PathBuf,
}

impl TestcaseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        TestcaseCache { root: root.into() }
    }

    /// Default location: `$CP_VERIFY_CACHE_DIR` or `.cp-verify/cache`.
    pub fn from_env() -> Self {
        let root = std::env::var_os("CP_VERIFY_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".cp-verify/cache"));
        TestcaseCache::new(root)
    }

    pub fn problem_dir(&self, url: &str) -> PathBuf {
        self.root.join("problems").join(url_key(url))
    }

    /// A directory counts as populated only when it holds at least one
    /// input file; anything less is treated as "needs redownload".
    pub fn is_populated(dir: &Path) -> bool {
        !Self::list_cases(dir).unwrap_or_default().is_empty()
    }

    /// Write fetched cases under the problem directory.
    pub fn store_cases(&self, url: &str, cases: &[TestCaseData]) -> Result<()> {
        let dir = self.problem_dir(url);
        let in_dir = dir.join("in");
        let out_dir = dir.join("out");
        std::fs::create_dir_all(&in_dir)
            .with_context(|| format!("Failed to create cache directory: {}", in_dir.display()))?;
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create cache directory: {}", out_dir.display()))?;

        for case in cases {
            std::fs::write(in_dir.join(format!("{}.in", case.name)), &case.input)
                .with_context(|| format!("Failed to write test input for {}", case.name))?;
            std::fs::write(out_dir.join(format!("{}.out", case.name)), &case.output)
                .with_context(|| format!("Failed to write test output for {}", case.name))?;
        }
        Ok(())
    }

    /// Enumerate the cases in a problem directory, sorted by name.
    ///
    /// Inputs without a matching expected output are kept; the tester
    /// falls back to a checker (or skips the answer comparison).
    pub fn list_cases(dir: &Path) -> Result<Vec<SystemTestCase>> {
        let in_dir = dir.join("in");
        if !in_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut cases = Vec::new();
        for entry in std::fs::read_dir(&in_dir)
            .with_context(|| format!("Failed to read cache directory: {}", in_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().map(|e| e == "in").unwrap_or(false) {
                let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                let output = dir.join("out").join(format!("{stem}.out"));
                cases.push(SystemTestCase {
                    name: stem,
                    input_path: path,
                    output_path: output.is_file().then_some(output),
                });
            }
        }
        cases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cases)
    }
}
