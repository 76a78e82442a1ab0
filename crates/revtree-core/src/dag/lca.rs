//! Lowest common ancestor (merge base) discovery.
//!
//! A common ancestor of two revisions is any revision reachable through
//! parent links from both, counting each revision as its own ancestor. A
//! *lowest* common ancestor is a common ancestor that is not itself an
//! ancestor of another common ancestor.
//!
//! Ordinary forks have exactly one LCA. Criss-cross histories, where two
//! branches merged each other independently, have several, and the merge
//! engine must first reduce them to a single virtual base.
//!
//! # Algorithm
//!
//! Both ancestor sets are marked over the arena from [`super::graph`]. The
//! intersection is then swept once in reverse topological order: every
//! parent of a common ancestor (or of anything already dominated) is
//! dominated. The undominated common ancestors are the LCAs. Each step is
//! linear in the size of the tree.

use std::collections::BTreeSet;

use crate::hash::Hash;

use super::graph::Graph;
use super::tree::{RevisionTree, TreeError};

/// Ancestry of a pair of revisions inside a [`Graph`].
pub(crate) struct Ancestry {
    left: Vec<bool>,
    right: Vec<bool>,
}

impl Ancestry {
    pub(crate) fn compute(graph: &Graph, left: usize, right: usize) -> Self {
        Self {
            left: graph.ancestry(left),
            right: graph.ancestry(right),
        }
    }

    fn is_common(&self, idx: usize) -> bool {
        self.left[idx] && self.right[idx]
    }

    pub(crate) fn common(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.left.len()).filter(|&i| self.is_common(i))
    }

    /// Revisions reachable from exactly one side.
    pub(crate) fn divergent(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.left.len()).filter(|&i| self.left[i] != self.right[i])
    }

    /// Lowest common ancestors, ascending by revision hash.
    pub(crate) fn lowest(&self, graph: &Graph) -> Vec<usize> {
        let mut dominated = vec![false; self.left.len()];
        for idx in (0..self.left.len()).rev() {
            if self.is_common(idx) || dominated[idx] {
                for &parent in graph.parents(idx) {
                    dominated[parent] = true;
                }
            }
        }
        let mut lowest: Vec<usize> = self.common().filter(|&i| !dominated[i]).collect();
        lowest.sort_by_key(|&i| graph.hash(i));
        lowest
    }
}

fn locate(graph: &Graph, hash: &Hash) -> Result<usize, TreeError> {
    graph.index_of(hash).ok_or(TreeError::NotFound(*hash))
}

/// Every common ancestor of `a` and `b` present in the tree, each revision
/// counting as its own ancestor.
///
/// # Errors
///
/// Returns [`TreeError::NotFound`] if either revision is not in the tree.
pub fn common_ancestors(
    tree: &RevisionTree,
    a: &Hash,
    b: &Hash,
) -> Result<BTreeSet<Hash>, TreeError> {
    let graph = Graph::from_tree(tree);
    let ancestry = Ancestry::compute(&graph, locate(&graph, a)?, locate(&graph, b)?);
    Ok(ancestry.common().map(|i| graph.hash(i)).collect())
}

/// The lowest common ancestors of `a` and `b`, ascending by hash.
///
/// - If `a == b`, returns `[a]`.
/// - If one is an ancestor of the other, returns the ancestor.
/// - If the two share no ancestor inside the tree, returns an empty vec.
///
/// # Errors
///
/// Returns [`TreeError::NotFound`] if either revision is not in the tree.
pub fn lowest_common_ancestors(
    tree: &RevisionTree,
    a: &Hash,
    b: &Hash,
) -> Result<Vec<Hash>, TreeError> {
    let graph = Graph::from_tree(tree);
    let ancestry = Ancestry::compute(&graph, locate(&graph, a)?, locate(&graph, b)?);
    Ok(ancestry
        .lowest(&graph)
        .into_iter()
        .map(|i| graph.hash(i))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
