//! Verification input: the scanned source files and their directives

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use super::verification::Verification;

/// One source file under consideration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationFile {
    /// Paths this file directly depends on, relative to the repository root.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<PathBuf>,

    /// The verification directives; an empty list means "not a test file".
    ///
    /// The input JSON may carry a single directive instead of a list.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verification: Vec<Verification>,

    /// Free-form attributes parsed from special comments (problem URL,
    /// limits, ignore flags). Not interpreted here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub document_attributes: BTreeMap<String, serde_json::Value>,
}

impl VerificationFile {
    /// Whether this file carries at least one directive.
    pub fn is_verification(&self) -> bool {
        !self.verification.is_empty()
    }

    /// Whether every directive short-circuits to a constant outcome.
    ///
    /// Such files are cheap and run on the first shard only.
    pub fn is_skippable_verification(&self) -> bool {
        self.is_verification() && self.verification.iter().all(Verification::is_skippable)
    }
}

/// The full scanned input, keyed by repository-relative path.
///
/// A `BTreeMap` keeps iteration lexicographic by path, which makes every
/// observable ordering (shard assignment, execution order, serialized
/// output) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationInput {
    #[serde(default)]
    pub files: BTreeMap<PathBuf, VerificationFile>,
}

impl VerificationInput {
    pub fn new(files: BTreeMap<PathBuf, VerificationFile>) -> Self {
        VerificationInput { files }
    }

    /// Load from a JSON file, normalizing every path to a clean relative
    /// form. Entries whose path cannot be made repository-relative are
    /// dropped with a warning.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        let raw: VerificationInput = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse input file: {}", path.display()))?;
        Ok(raw.normalized())
    }

    /// Rebuild the map with normalized relative paths.
    pub fn normalized(self) -> Self {
        let mut files = BTreeMap::new();
        for (file_path, mut f) in self.files {
            let Some(p) = normalize_path(&file_path) else {
                warn!(path = %file_path.display(), "dropping file outside the repository");
                continue;
            };
            f.dependencies = f
                .dependencies
                .iter()
                .filter_map(|d| normalize_path(d))
                .collect();
            files.insert(p, f);
        }
        VerificationInput { files }
    }

    /// Overlay `other` on top of `self` (right-biased per path).
    pub fn merge(mut self, other: VerificationInput) -> VerificationInput {
        self.files.extend(other.files);
        self
    }

    /// The direct dependency edges, for building a dependency graph.
    pub fn dependency_edges(&self) -> BTreeMap<PathBuf, BTreeSet<PathBuf>> {
        self.files
            .iter()
            .map(|(p, f)| (p.clone(), f.dependencies.clone()))
            .collect()
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize input")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write input file: {}", path.display()))?;
        Ok(())
    }
}

/// Make a path repository-relative and free of `.` components.
///
/// Absolute paths are stripped against the current directory; paths that
/// escape the root (or start with `..`) resolve to `None`.
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    let relative = if path.is_absolute() {
        let cwd = std::env::current_dir().ok()?;
        path.strip_prefix(&cwd).ok()?.to_path_buf()
    } else {
        path.to_path_buf()
    };

    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => clean.push(part),
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        return None;
    }
    Some(clean)
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<Verification>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<Verification>),
        Many(Vec<Verification>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(v)) => vec![*v],
        Some(OneOrMany::Many(vs)) => vs,
    })
}
