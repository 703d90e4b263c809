//! Transitive dependency closure over source files
//!
//! Edges are directed file -> dependency. Edges may point at paths with no
//! entry of their own (treated as leaves) and cycles are tolerated, since
//! header-style libraries routinely include each other.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The file -> file dependency relation.
///
/// Closure queries are memoized per path for the lifetime of the graph, so
/// repeated queries over a large file set stay O(V+E) amortized rather than
/// one full traversal each.
#[derive(Debug)]
pub struct DependencyGraph {
    edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    memo: RefCell<HashMap<PathBuf, Rc<BTreeSet<PathBuf>>>>,
}

impl DependencyGraph {
    pub fn new(edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>) -> Self {
        DependencyGraph {
            edges,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// The set of all paths reachable from `path`, including `path` itself.
    ///
    /// Iterative traversal with a visited set, so cycles and self-loops
    /// terminate. A path without an edge entry resolves to just itself.
    pub fn transitive_depends_on(&self, path: &Path) -> Rc<BTreeSet<PathBuf>> {
        if let Some(cached) = self.memo.borrow().get(path) {
            return Rc::clone(cached);
        }

        let mut visited: BTreeSet<PathBuf> = BTreeSet::new();
        let mut stack: Vec<PathBuf> = vec![path.to_path_buf()];
        while let Some(p) = stack.pop() {
            if !visited.insert(p.clone()) {
                continue;
            }
            // A completed closure for a dependency covers everything
            // reachable from it; splice it in instead of re-walking.
            if p != path {
                if let Some(cached) = self.memo.borrow().get(&p) {
                    visited.extend(cached.iter().cloned());
                    continue;
                }
            }
            if let Some(deps) = self.edges.get(&p) {
                stack.extend(deps.iter().cloned());
            }
        }

        let closure = Rc::new(visited);
        self.memo
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&closure));
        closure
    }
}
