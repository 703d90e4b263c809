//! Incremental re-runs against a previous result

use chrono::{DateTime, Duration, Utc};
use serial_test::serial;
use std::collections::BTreeSet;
use std::path::PathBuf;

use cp_verify::models::{ResultStatus, VerificationInput, VerifyCommandResult};
use cp_verify::timestamp::{GitTimestamp, TimestampSource};
use cp_verify::verify::VerifyOptions;

use super::helpers::*;

fn input_for(path: &std::path::Path, command: &str) -> VerificationInput {
    let json = format!(
        r#"{{"files":{{"{}":{{"verification":[{{"type":"command","command":"{}"}}]}}}}}}"#,
        path.display(),
        command
    );
    serde_json::from_str(&json).expect("Failed to parse input JSON")
}

fn prev_result_for(
    path: &std::path::Path,
    status: ResultStatus,
    at: chrono::DateTime<Utc>,
) -> VerifyCommandResult {
    let json = format!(
        r#"{{"total_seconds":1.0,"files":{{"{}":{{"verifications":[
            {{"status":"{}","elapsed":1.0,"last_execution_time":"{}"}}
        ]}}}}}}"#,
        path.display(),
        status,
        at.to_rfc3339()
    );
    serde_json::from_str(&json).expect("Failed to parse result JSON")
}

#[test]
fn test_no_change_rerun_selects_nothing() {
    let ws = Workspace::new();
    // The command would fail if it ran; a carried-over entry proves it
    // did not.
    let path = ws.add_source("stable_test.py");
    let prev = prev_result_for(
        &path,
        ResultStatus::Success,
        Utc::now() + Duration::hours(1),
    );

    let verifier = ws.verifier(
        input_for(&path, "false"),
        VerifyOptions {
            prev_result: Some(prev),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();

    let carried = &result.files[&path];
    assert_eq!(carried.status(), ResultStatus::Success);
    assert!(!carried.newest);
}

#[test]
fn test_source_change_forces_rerun() {
    let ws = Workspace::new();
    let path = ws.add_source("changed_test.py");
    // Last success predates the file's mtime by a wide margin.
    let prev = prev_result_for(
        &path,
        ResultStatus::Success,
        Utc::now() - Duration::days(30),
    );

    let verifier = ws.verifier(
        input_for(&path, "true"),
        VerifyOptions {
            prev_result: Some(prev),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();

    let rerun = &result.files[&path];
    assert_eq!(rerun.status(), ResultStatus::Success);
    assert!(rerun.newest);
}

#[test]
fn test_previous_failure_is_always_retried() {
    let ws = Workspace::new();
    let path = ws.add_source("flaky_test.py");
    // Failure recorded in the future: freshness alone would keep it, but
    // failures are never trusted.
    let prev = prev_result_for(
        &path,
        ResultStatus::Failure,
        Utc::now() + Duration::hours(1),
    );

    let verifier = ws.verifier(
        input_for(&path, "true"),
        VerifyOptions {
            prev_result: Some(prev),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();

    let rerun = &result.files[&path];
    assert_eq!(rerun.status(), ResultStatus::Success);
    assert!(rerun.newest);
}

#[test]
fn test_deleted_file_drops_out_of_carried_results() {
    let ws = Workspace::new();
    let path = ws.add_source("removed_test.py");
    let prev = prev_result_for(
        &path,
        ResultStatus::Success,
        Utc::now() + Duration::hours(1),
    );
    let input = input_for(&path, "true");
    std::fs::remove_file(&path).unwrap();

    let verifier = ws.verifier(
        input,
        VerifyOptions {
            prev_result: Some(prev),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();
    assert!(result.files.is_empty());
}

#[test]
#[serial]
fn test_git_commit_times_feed_the_staleness_oracle() {
    let ws = Workspace::new();
    ws.add_source("lib.py");
    git_commit_all(ws.root(), "initial");

    let _guard = DirGuard::enter(ws.root());

    let mut tracked = BTreeSet::new();
    tracked.insert(PathBuf::from("lib.py"));
    let committed = GitTimestamp.timestamp(&tracked).unwrap();
    assert!(committed > DateTime::<Utc>::MIN_UTC);
    assert!(committed <= Utc::now());

    // Untracked paths report the beginning-of-time sentinel, so they
    // always compare as stale.
    let mut untracked = BTreeSet::new();
    untracked.insert(PathBuf::from("never_committed.py"));
    let sentinel = GitTimestamp.timestamp(&untracked).unwrap();
    assert_eq!(sentinel, DateTime::<Utc>::MIN_UTC);
}

#[test]
fn test_dependency_change_propagates_through_graph() {
    let ws = Workspace::new();
    let dep = ws.add_source("lib/core.py");
    let path = ws.add_source("core_test.py");
    let json = format!(
        r#"{{"files":{{
            "{dep}":{{}},
            "{test}":{{
                "dependencies":["{dep}"],
                "verification":[{{"type":"command","command":"true"}}]
            }}
        }}}}"#,
        dep = dep.display(),
        test = path.display()
    );
    let input: VerificationInput = serde_json::from_str(&json).unwrap();

    // Success recorded before the dependency was (re)written.
    let prev = prev_result_for(
        &path,
        ResultStatus::Success,
        Utc::now() - Duration::days(30),
    );

    let verifier = ws.verifier(
        input,
        VerifyOptions {
            prev_result: Some(prev),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();
    assert!(result.files[&path].newest);
}
