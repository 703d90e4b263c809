//! Test-case acquisition and judging for problem verifications

pub mod cache;
pub mod comparer;
pub mod problem;
pub mod tester;

pub use cache::{SystemTestCase, TestCaseData, TestcaseCache};
pub use comparer::OutputComparator;
pub use problem::{problem_from_url, Problem, ProblemError};
pub use tester::{run_problem, ProblemTest};
