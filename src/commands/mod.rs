//! CLI command implementations

pub mod check;
pub mod download;
pub mod merge_input;
pub mod merge_result;
pub mod verify;
