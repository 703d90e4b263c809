//! Git plumbing used as a read-only commit-time oracle

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Run a git command in the current directory and return the raw output.
pub fn run_git<S: AsRef<std::ffi::OsStr>>(args: &[S]) -> Result<Output> {
    Command::new("git").args(args).output().with_context(|| {
        let joined: Vec<String> = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect();
        format!("Failed to execute: git {}", joined.join(" "))
    })
}

/// Run a git command, check for success, and return stdout as a string.
pub fn run_git_checked<S: AsRef<std::ffi::OsStr>>(args: &[S]) -> Result<String> {
    let output = run_git(args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git command failed: {stderr}");
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// The most recent commit time touching any of `paths`.
///
/// Returns the beginning-of-time sentinel when none of the paths is
/// tracked, so untracked inputs always compare as stale.
pub fn commit_time(paths: &BTreeSet<PathBuf>) -> Result<DateTime<Utc>> {
    let mut args: Vec<std::ffi::OsString> = vec![
        "log".into(),
        "-1".into(),
        "--date=iso".into(),
        "--pretty=%ad".into(),
        "--".into(),
    ];
    args.extend(paths.iter().map(|p| p.as_os_str().to_owned()));

    let stdout = run_git_checked(&args)?;
    let timestamp = stdout.trim();
    if timestamp.is_empty() {
        return Ok(DateTime::<Utc>::MIN_UTC);
    }
    let parsed = DateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S %z")
        .with_context(|| format!("Failed to parse git commit time: {timestamp:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// The repository root, per `git rev-parse --show-toplevel`.
pub fn root_directory() -> Result<PathBuf> {
    let stdout = run_git_checked(&["rev-parse", "--show-toplevel"])?;
    Ok(PathBuf::from(stdout.trim()))
}
