//! Integration tests for the verification pipeline
//!
//! These tests exercise end-to-end flows: input JSON to result JSON,
//! incremental re-runs against a previous result, sharded execution,
//! judged problems served from local directories, and result merging.

pub mod incremental_flow;
pub mod merge_flow;
pub mod problem_flow;
pub mod verify_flow;
