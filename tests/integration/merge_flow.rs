//! Shard merging and the check verdict
//!
//! Result files key by repository-relative path, so these tests run from
//! inside the workspace.

use serial_test::serial;
use std::path::{Path, PathBuf};

use cp_verify::commands::{check, merge_result};
use cp_verify::models::{ResultStatus, VerificationInput, VerifyCommandResult};
use cp_verify::verify::{SplitState, VerifyOptions};

use super::helpers::*;

fn input_for(entries: &[(&str, &str)]) -> VerificationInput {
    let body: Vec<String> = entries
        .iter()
        .map(|(p, cmd)| {
            format!(
                r#""{p}":{{"verification":[{{"type":"command","command":"{cmd}"}}]}}"#
            )
        })
        .collect();
    serde_json::from_str(&format!(r#"{{"files":{{{}}}}}"#, body.join(",")))
        .expect("Failed to parse input JSON")
}

#[test]
#[serial]
fn test_shard_results_merge_into_one_passing_report() {
    let ws = Workspace::new();
    for name in ["a_test.py", "b_test.py", "c_test.py"] {
        ws.add_source(name);
    }
    let entries = [
        ("a_test.py", "true"),
        ("b_test.py", "true"),
        ("c_test.py", "true"),
    ];

    let _guard = DirGuard::enter(ws.root());
    let mut shard_files = Vec::new();
    for index in 0..2 {
        let result = ws
            .verifier(
                input_for(&entries),
                VerifyOptions {
                    split_state: Some(SplitState::new(2, index).unwrap()),
                    ..Default::default()
                },
            )
            .verify()
            .unwrap();
        let path = PathBuf::from(format!("result_{index}.json"));
        result.save_file(&path).unwrap();
        shard_files.push(path);
    }

    let merged_path = PathBuf::from("merged.json");
    assert!(merge_result::execute(&shard_files, Some(&merged_path)).unwrap());

    let merged = VerifyCommandResult::from_file(&merged_path).unwrap();
    assert_eq!(merged.files.len(), 3);
    assert!(check::execute(&[merged_path]).unwrap());
}

#[test]
#[serial]
fn test_check_fails_when_any_shard_failed() {
    let ws = Workspace::new();
    ws.add_source("good_test.py");
    ws.add_source("bad_test.py");

    let _guard = DirGuard::enter(ws.root());
    let ok_result = ws
        .verifier(input_for(&[("good_test.py", "true")]), VerifyOptions::default())
        .verify()
        .unwrap();
    let bad_result = ws
        .verifier(input_for(&[("bad_test.py", "false")]), VerifyOptions::default())
        .verify()
        .unwrap();

    let ok_path = PathBuf::from("ok.json");
    let bad_path = PathBuf::from("bad.json");
    ok_result.save_file(&ok_path).unwrap();
    bad_result.save_file(&bad_path).unwrap();

    assert!(!check::execute(&[ok_path, bad_path]).unwrap());
}

#[test]
#[serial]
fn test_carried_over_entries_lose_to_fresh_ones_when_merged() {
    let ws = Workspace::new();
    ws.add_source("shared_test.py");

    let _guard = DirGuard::enter(ws.root());

    // Run 1: the file fails.
    let failed = ws
        .verifier(input_for(&[("shared_test.py", "false")]), VerifyOptions::default())
        .verify()
        .unwrap();

    // Run 2: fixed, rerun with the old result carried over.
    let fixed = ws
        .verifier(
            input_for(&[("shared_test.py", "true")]),
            VerifyOptions {
                prev_result: Some(failed.clone()),
                ..Default::default()
            },
        )
        .verify()
        .unwrap();

    let first = PathBuf::from("first.json");
    let second = PathBuf::from("second.json");
    failed.save_file(&first).unwrap();
    fixed.save_file(&second).unwrap();

    let merged_path = PathBuf::from("merged.json");
    merge_result::execute(&[first, second], Some(&merged_path)).unwrap();

    let merged = VerifyCommandResult::from_file(&merged_path).unwrap();
    assert_eq!(
        merged.files[Path::new("shared_test.py")].status(),
        ResultStatus::Success
    );
    assert!(check::execute(&[merged_path]).unwrap());
}
