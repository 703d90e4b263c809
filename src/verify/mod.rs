//! Work selection, sharding and batch execution

pub mod split_state;
pub mod verifier;

pub use split_state::SplitState;
pub use verifier::{Verifier, VerifyOptions};
