//! End-to-end verify runs over command and const directives

use serial_test::serial;

use cp_verify::commands::verify::{self, VerifyArgs};
use cp_verify::models::{ResultStatus, VerificationInput, VerifyCommandResult};
use cp_verify::verify::{SplitState, VerifyOptions};

use super::helpers::*;

fn load_input(json: &str) -> VerificationInput {
    serde_json::from_str(json).expect("Failed to parse input JSON")
}

#[test]
#[serial]
fn test_verify_command_writes_result_file() {
    let ws = Workspace::new();
    ws.add_source("lib/algebra.py");
    ws.add_source("tests/algebra_test.py");
    ws.write_input(
        r#"{
            "files": {
                "lib/algebra.py": {},
                "tests/algebra_test.py": {
                    "dependencies": ["lib/algebra.py"],
                    "verification": [{"type": "command", "command": "true"}]
                }
            }
        }"#,
    );

    let _guard = DirGuard::enter(ws.root());
    let passed = verify::execute(VerifyArgs {
        input: "verify.json".into(),
        timeout: None,
        tle: 10.0,
        mle: None,
        prev_result: None,
        split: None,
        split_index: None,
        output: "result.json".into(),
        download: true,
    })
    .expect("verify should not error");

    assert!(passed);
    let result = VerifyCommandResult::from_file("result.json".as_ref()).unwrap();
    assert_eq!(result.files.len(), 1);
    assert!(result.files.keys().all(|p| p.ends_with("algebra_test.py")));
    assert!(result.is_success(false));
    assert!(result.total_seconds > 0.0);
}

#[test]
#[serial]
fn test_verify_failure_sets_exit_verdict_but_still_writes() {
    let ws = Workspace::new();
    ws.add_source("bad_test.py");
    ws.write_input(
        r#"{"files":{"bad_test.py":{"verification":[{"type":"command","command":"false"}]}}}"#,
    );

    let _guard = DirGuard::enter(ws.root());
    let passed = verify::execute(VerifyArgs {
        input: "verify.json".into(),
        timeout: None,
        tle: 10.0,
        mle: None,
        prev_result: None,
        split: None,
        split_index: None,
        output: "result.json".into(),
        download: true,
    })
    .expect("verify should not error");

    assert!(!passed);
    let result = VerifyCommandResult::from_file("result.json".as_ref()).unwrap();
    assert_eq!(
        result.files.values().next().unwrap().status(),
        ResultStatus::Failure
    );
}

#[test]
fn test_exhausted_budget_marks_everything_skipped() {
    let ws = Workspace::new();
    let a = ws.add_source("a_test.py");
    let b = ws.add_source("b_test.py");
    let json = format!(
        r#"{{"files":{{
            "{}":{{"verification":[{{"type":"command","command":"true"}}]}},
            "{}":{{"verification":[{{"type":"command","command":"true"}}]}}
        }}}}"#,
        a.display(),
        b.display()
    );

    let verifier = ws.verifier(
        load_input(&json),
        VerifyOptions {
            timeout: Some(0.0),
            ..Default::default()
        },
    );
    let result = verifier.verify().unwrap();

    assert_eq!(result.files.len(), 2);
    for file in result.files.values() {
        assert_eq!(file.status(), ResultStatus::Skipped);
    }
    // Skips are not failures: downstream check still passes.
    assert!(result.is_success(true));
    assert!(!result.is_success(false));
}

#[test]
fn test_shards_are_disjoint_and_cover_everything() {
    let ws = Workspace::new();
    let mut json_entries = Vec::new();
    for i in 0..7 {
        let path = ws.add_source(&format!("t{i}_test.py"));
        json_entries.push(format!(
            r#""{}":{{"verification":[{{"type":"command","command":"true"}}]}}"#,
            path.display()
        ));
    }
    let json = format!(r#"{{"files":{{{}}}}}"#, json_entries.join(","));

    let mut merged = VerifyCommandResult::default();
    let mut total_entries = 0;
    for index in 0..3 {
        let verifier = ws.verifier(
            load_input(&json),
            VerifyOptions {
                split_state: Some(SplitState::new(3, index).unwrap()),
                ..Default::default()
            },
        );
        let shard = verifier.verify().unwrap();
        total_entries += shard.files.len();
        merged = merged.merge(shard);
    }

    assert_eq!(total_entries, 7);
    assert_eq!(merged.files.len(), 7);
    assert!(merged.is_success(false));
}

#[test]
fn test_const_directives_run_on_first_shard_only() {
    let ws = Workspace::new();
    let ignored = ws.add_source("ignored.py");
    let real = ws.add_source("real_test.py");
    let json = format!(
        r#"{{"files":{{
            "{}":{{"verification":[{{"type":"const","status":"skipped"}}]}},
            "{}":{{"verification":[{{"type":"command","command":"true"}}]}}
        }}}}"#,
        ignored.display(),
        real.display()
    );

    let shard0 = ws
        .verifier(
            load_input(&json),
            VerifyOptions {
                split_state: Some(SplitState::new(2, 0).unwrap()),
                ..Default::default()
            },
        )
        .verify()
        .unwrap();
    assert!(shard0.files.contains_key(&ignored));
    assert_eq!(shard0.files[&ignored].status(), ResultStatus::Skipped);

    let shard1 = ws
        .verifier(
            load_input(&json),
            VerifyOptions {
                split_state: Some(SplitState::new(2, 1).unwrap()),
                ..Default::default()
            },
        )
        .verify()
        .unwrap();
    assert!(!shard1.files.contains_key(&ignored));
}
