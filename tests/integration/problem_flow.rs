//! Judged problem runs against local test-case directories

use cp_verify::models::{JudgeStatus, ResultStatus, VerificationInput};
use cp_verify::verify::VerifyOptions;

use super::helpers::*;

fn problem_input(path: &std::path::Path, url: &str, command: &str, extra: &str) -> VerificationInput {
    let json = format!(
        r#"{{"files":{{"{}":{{"verification":[
            {{"type":"problem","command":"{}","problem":"{}"{}}}
        ]}}}}}}"#,
        path.display(),
        command,
        url,
        extra
    );
    serde_json::from_str(&json).expect("Failed to parse input JSON")
}

#[test]
fn test_accepted_solution_succeeds_with_testcase_details() {
    let ws = Workspace::new();
    let path = ws.add_source("aplusb_test.py");
    let url = ws.add_problem("aplusb", &[("case_00", "1 2\n", "1 2\n"), ("case_01", "5 7\n", "5 7\n")]);

    let verifier = ws.verifier(
        problem_input(&path, &url, "cat", ""),
        VerifyOptions::default(),
    );
    let result = verifier.verify().unwrap();

    let file = &result.files[&path];
    assert_eq!(file.status(), ResultStatus::Success);

    let verification = &file.verifications[0];
    let cases = verification.testcases.as_ref().unwrap();
    assert_eq!(cases.len(), 2);
    assert!(cases.iter().all(|c| c.status == JudgeStatus::Ac));
    assert_eq!(cases[0].name, "case_00");
    assert!(verification.slowest.is_some());
    assert!(verification.elapsed > 0.0);
}

#[test]
fn test_wrong_answer_fails_the_file() {
    let ws = Workspace::new();
    let path = ws.add_source("wrong_test.py");
    let url = ws.add_problem("wrong", &[("case_00", "1 2\n", "3\n")]);

    let verifier = ws.verifier(
        problem_input(&path, &url, "cat", ""),
        VerifyOptions::default(),
    );
    let result = verifier.verify().unwrap();

    let file = &result.files[&path];
    assert_eq!(file.status(), ResultStatus::Failure);
    let cases = file.verifications[0].testcases.as_ref().unwrap();
    assert_eq!(cases[0].status, JudgeStatus::Wa);
}

#[test]
fn test_float_tolerance_accepts_close_answers() {
    let ws = Workspace::new();
    let path = ws.add_source("pi_test.py");
    let url = ws.add_problem("pi", &[("case_00", "\n", "3.14159265\n")]);

    let verifier = ws.verifier(
        problem_input(&path, &url, "echo 3.14159266", r#","error":1e-6"#),
        VerifyOptions::default(),
    );
    let result = verifier.verify().unwrap();
    assert_eq!(result.files[&path].status(), ResultStatus::Success);
}

#[test]
fn test_time_limit_classifies_tle() {
    let ws = Workspace::new();
    let path = ws.add_source("slow_test.py");
    let url = ws.add_problem("slow", &[("case_00", "\n", "\n")]);

    let verifier = ws.verifier(
        problem_input(&path, &url, "sleep 5", r#","tle":0.2"#),
        VerifyOptions::default(),
    );
    let result = verifier.verify().unwrap();

    let file = &result.files[&path];
    assert_eq!(file.status(), ResultStatus::Failure);
    let cases = file.verifications[0].testcases.as_ref().unwrap();
    assert_eq!(cases[0].status, JudgeStatus::Tle);
}

#[test]
fn test_unsupported_problem_url_records_failure_not_abort() {
    let ws = Workspace::new();
    let bad = ws.add_source("bad_url_test.py");
    let good = ws.add_source("good_test.py");
    let url = ws.add_problem("good", &[("case_00", "x\n", "x\n")]);

    let json = format!(
        r#"{{"files":{{
            "{bad}":{{"verification":[{{"type":"problem","command":"cat","problem":"gopher://nope"}}]}},
            "{good}":{{"verification":[{{"type":"problem","command":"cat","problem":"{url}"}}]}}
        }}}}"#,
        bad = bad.display(),
        good = good.display(),
        url = url
    );
    let input: VerificationInput = serde_json::from_str(&json).unwrap();

    let verifier = ws.verifier(input, VerifyOptions::default());
    let result = verifier.verify().unwrap();

    // The bad URL fails its own file; the rest of the batch still runs.
    assert_eq!(result.files[&bad].status(), ResultStatus::Failure);
    assert_eq!(result.files[&good].status(), ResultStatus::Success);
}
