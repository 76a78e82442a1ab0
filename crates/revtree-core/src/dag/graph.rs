//! Arena-indexed view of a revision tree.
//!
//! Ancestry queries during a merge walk the DAG many times, so the merge
//! engine works on a flat arena instead of the hash-keyed tree: nodes are
//! numbered in topological order and parent links are stored as indices.
//! Because every parent index is smaller than its child's, reachability can
//! be propagated in a single reverse sweep.
//!
//! Revisions synthesized while merging are appended with [`Graph::push`];
//! their parents are always already present, which keeps the ordering
//! invariant intact.

use std::collections::HashMap;
use std::sync::Arc;

use crate::hash::Hash;
use crate::revision::Revision;

use super::tree::RevisionTree;

#[derive(Debug, Clone)]
struct Node {
    revision: Arc<Revision>,
    /// Indices of parents present in the arena.
    parents: Vec<usize>,
    /// At least one parent is absent from the arena.
    incomplete: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Graph {
    nodes: Vec<Node>,
    index: HashMap<Hash, usize>,
}

impl Graph {
    pub(crate) fn from_tree(tree: &RevisionTree) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(tree.len()),
            index: HashMap::with_capacity(tree.len()),
        };
        for revision in tree.ordered_arcs() {
            graph.push(Arc::clone(revision));
        }
        graph
    }

    /// Append a revision, returning its index. A revision already present
    /// keeps its existing index.
    pub(crate) fn push(&mut self, revision: Arc<Revision>) -> usize {
        if let Some(&existing) = self.index.get(&revision.revision()) {
            return existing;
        }
        let mut parents = Vec::with_capacity(revision.parents().len());
        let mut incomplete = false;
        for parent in revision.parents() {
            match self.index.get(parent) {
                Some(&i) => parents.push(i),
                None => incomplete = true,
            }
        }
        let idx = self.nodes.len();
        self.index.insert(revision.revision(), idx);
        self.nodes.push(Node {
            revision,
            parents,
            incomplete,
        });
        idx
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn index_of(&self, hash: &Hash) -> Option<usize> {
        self.index.get(hash).copied()
    }

    pub(crate) fn revision(&self, idx: usize) -> &Arc<Revision> {
        &self.nodes[idx].revision
    }

    pub(crate) fn hash(&self, idx: usize) -> Hash {
        self.nodes[idx].revision.revision()
    }

    pub(crate) fn parents(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].parents
    }

    pub(crate) fn is_incomplete(&self, idx: usize) -> bool {
        self.nodes[idx].incomplete
    }

    /// Mark `idx` and everything reachable from it through parent links.
    pub(crate) fn ancestry(&self, idx: usize) -> Vec<bool> {
        let mut marked = vec![false; self.nodes.len()];
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if !marked[current] {
                marked[current] = true;
                stack.extend_from_slice(&self.nodes[current].parents);
            }
        }
        marked
    }
}
