//! Work sharding for parallel CI jobs

use anyhow::{bail, Result};
use std::fmt;

/// One shard of a deterministic split: this process handles shard
/// `index` out of `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitState {
    pub size: usize,
    pub index: usize,
}

impl SplitState {
    pub fn new(size: usize, index: usize) -> Result<Self> {
        if size == 0 {
            bail!("split size must be positive");
        }
        if index >= size {
            bail!("split index {index} out of range for size {size}");
        }
        Ok(SplitState { size, index })
    }

    /// Build from the optional CLI pair; both flags must be given together.
    pub fn from_options(size: Option<usize>, index: Option<usize>) -> Result<Option<Self>> {
        match (size, index) {
            (None, None) => Ok(None),
            (Some(size), Some(index)) => Ok(Some(SplitState::new(size, index)?)),
            _ => bail!("--split and --split-index must be specified together"),
        }
    }

    /// This shard handles all of the list when it is no larger than the
    /// shard count (then only shards below `len` get one item each).
    pub fn split<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let len = items.len();
        if len <= self.size {
            if self.index < len {
                return &items[self.index..self.index + 1];
            }
            return &[];
        }
        let start = len * self.index / self.size;
        let end = len * (self.index + 1) / self.size;
        &items[start..end]
    }
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.size)
    }
}
