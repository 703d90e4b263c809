//! Data model for verification inputs and results

pub mod file;
pub mod result;
pub mod shell;
pub mod status;
pub mod verification;

pub use file::{normalize_path, VerificationFile, VerificationInput};
pub use result::{FileResult, TestcaseResult, VerificationResult, VerifyCommandResult};
pub use shell::{RawCommand, ShellCommand, ShellCommandLike};
pub use status::{JudgeStatus, ResultStatus};
pub use verification::Verification;
