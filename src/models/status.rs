//! Status enums shared by verification and judging

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one verification directive.
///
/// The variant order defines severity: when a file carries several
/// verifications its aggregate status is the worst one, and
/// `Failure > Skipped > Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Skipped,
    Failure,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultStatus::Success => "success",
            ResultStatus::Skipped => "skipped",
            ResultStatus::Failure => "failure",
        };
        write!(f, "{s}")
    }
}

impl ResultStatus {
    /// All statuses in reporting order.
    pub const ALL: [ResultStatus; 3] = [
        ResultStatus::Success,
        ResultStatus::Failure,
        ResultStatus::Skipped,
    ];
}

/// Per-testcase verdict when running against a judge problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JudgeStatus {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "RE")]
    Re,
    #[serde(rename = "TLE")]
    Tle,
    #[serde(rename = "MLE")]
    Mle,
}

impl fmt::Display for JudgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JudgeStatus::Ac => "AC",
            JudgeStatus::Wa => "WA",
            JudgeStatus::Re => "RE",
            JudgeStatus::Tle => "TLE",
            JudgeStatus::Mle => "MLE",
        };
        write!(f, "{s}")
    }
}
