//! Compressed prefix tree.
//!
//! Internal nodes may span several tokens. An internal node never has another
//! internal node as its only child: when insertion discovers a new branching
//! point the shared tokens become one node, and when removal leaves a node
//! with a single internal child the two are merged.
//!
//! Sibling internal nodes always differ at the token right after their
//! parent's label, so every descent follows at most one child.

use std::fmt;
use std::hash::Hash;
use std::mem;

use crate::node::{check_limit, common_prefix_len, rank_matches, Branch, Leaf, Match, Node};
use crate::registry::Registry;
use crate::{Aggregation, Autocompleter, Config, Result};

/// A prefix tree with single-child chains collapsed.
#[derive(Clone)]
pub struct CompressedPrefixTree<V, T> {
    root: Branch<V, T>,
    config: Config,
    registry: Registry<V, T>,
}

impl<V, T> CompressedPrefixTree<V, T> {
    /// Create an empty tree aggregating weights with `aggregation`.
    pub fn new(aggregation: Aggregation) -> Self {
        Self::with_config(aggregation.into())
    }

    /// Create an empty tree using every setting in `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            root: Branch::empty(),
            config,
            registry: Registry::new(),
        }
    }

    /// Settings the tree was built with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Aggregate weight of the whole tree, `0.0` when empty.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.root.weight
    }

    /// Number of internal nodes, the root included.
    pub fn node_count(&self) -> usize {
        if self.root.is_empty() {
            return 0;
        }
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(branch) = stack.pop() {
            count += 1;
            stack.extend(branch.children.iter().filter_map(Node::as_branch));
        }
        count
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Branch<V, T> {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry<V, T> {
        &self.registry
    }
}

impl<V, T> Default for CompressedPrefixTree<V, T> {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<V: Clone + Eq + Hash, T: Clone + Eq> CompressedPrefixTree<V, T> {
    /// Whether `value` is stored anywhere in the tree.
    pub fn contains(&self, value: &V) -> bool {
        self.registry.contains(value)
    }
}

/// Index of the internal child of `node` continuing with `token`.
fn child_for<V, T: PartialEq>(node: &Branch<V, T>, token: &T) -> Option<usize> {
    let depth = node.label.len();
    node.children
        .iter()
        .position(|child| child.as_branch().is_some_and(|b| b.label.get(depth) == Some(token)))
}

/// Put `old` and the new leaf under a fresh node labelled with the first
/// `shared` tokens of `prefix`.
///
/// `old`'s label must diverge from `prefix` at `shared`, or `prefix` must end
/// there.
fn split<V, T: Clone>(
    old: Branch<V, T>,
    leaf: Leaf<V>,
    prefix: &[T],
    shared: usize,
    aggregation: Aggregation,
) -> Branch<V, T> {
    tracing::trace!(
        shared,
        old_len = old.label.len(),
        new_len = prefix.len(),
        "splitting node"
    );
    let mut parent = Branch::with_label(prefix[..shared].to_vec());
    parent.children.push(Node::Branch(old));
    if shared == prefix.len() {
        parent.children.push(Node::Leaf(leaf));
    } else {
        parent
            .children
            .push(Node::Branch(Branch::holding(prefix.to_vec(), leaf, aggregation)));
    }
    parent.refresh(aggregation);
    parent
}

/// Insert `leaf` below `node`, whose label is a prefix of `prefix`.
fn insert_at<V: PartialEq, T: Clone + PartialEq>(
    node: &mut Branch<V, T>,
    leaf: Leaf<V>,
    prefix: &[T],
    aggregation: Aggregation,
) {
    let depth = node.label.len();
    if depth == prefix.len() {
        node.merge_leaf(leaf);
    } else {
        match child_for(node, &prefix[depth]) {
            None => {
                let holder = Branch::holding(prefix.to_vec(), leaf, aggregation);
                node.children.push(Node::Branch(holder));
            }
            Some(idx) => {
                if let Some(child) = node.children[idx].as_branch_mut() {
                    let shared = common_prefix_len(&child.label, prefix);
                    if shared == child.label.len() {
                        insert_at(child, leaf, prefix, aggregation);
                    } else {
                        let old = mem::replace(child, Branch::empty());
                        *child = split(old, leaf, prefix, shared, aggregation);
                    }
                }
            }
        }
    }
    node.refresh(aggregation);
}

fn collect_matches<'a, V, T: PartialEq>(
    node: &'a Branch<V, T>,
    query: &[T],
    out: &mut Vec<Match<'a, V>>,
) {
    let shared = common_prefix_len(&node.label, query);
    if shared == query.len() {
        node.collect(out);
    } else if shared == node.label.len() {
        if let Some(idx) = child_for(node, &query[shared]) {
            if let Some(child) = node.children[idx].as_branch() {
                collect_matches(child, query, out);
            }
        }
    }
}

/// Remove every value under `node` matching `prefix`, which strictly extends
/// `node`'s label. Leaves `node` empty or free of single internal children.
fn remove_at<V, T: PartialEq>(
    node: &mut Branch<V, T>,
    prefix: &[T],
    removed: &mut Vec<V>,
    aggregation: Aggregation,
) {
    let Some(idx) = child_for(node, &prefix[node.label.len()]) else {
        return;
    };
    let Some(child) = node.children[idx].as_branch_mut() else {
        return;
    };

    let shared = common_prefix_len(&child.label, prefix);
    if shared == prefix.len() {
        node.discard_child(idx, removed);
    } else if shared == child.label.len() {
        remove_at(child, prefix, removed, aggregation);
        if child.is_empty() {
            node.children.remove(idx);
        } else {
            child.collapse();
        }
    } else {
        return;
    }
    node.refresh(aggregation);
}

impl<V: Clone + Eq + Hash, T: Clone + Eq> Autocompleter<V, T> for CompressedPrefixTree<V, T> {
    fn len(&self) -> usize {
        self.root.len
    }

    fn insert(&mut self, value: V, weight: f64, prefix: &[T]) -> Result<()> {
        let seq = self
            .registry
            .admit(&value, weight, prefix, self.config.max_prefix_len)?;
        let leaf = Leaf { value, weight, seq };
        let aggregation = self.config.aggregation;

        if self.root.is_empty() {
            self.root = Branch::holding(prefix.to_vec(), leaf, aggregation);
            return Ok(());
        }

        let shared = common_prefix_len(&self.root.label, prefix);
        if shared == self.root.label.len() {
            insert_at(&mut self.root, leaf, prefix, aggregation);
        } else {
            let old = mem::replace(&mut self.root, Branch::empty());
            self.root = split(old, leaf, prefix, shared, aggregation);
        }
        Ok(())
    }

    fn autocomplete(&self, prefix: &[T], limit: Option<usize>) -> Result<Vec<(&V, f64)>> {
        check_limit(limit)?;
        let mut matches = Vec::new();
        if !self.root.is_empty() {
            collect_matches(&self.root, prefix, &mut matches);
        }
        Ok(rank_matches(matches, limit))
    }

    fn remove(&mut self, prefix: &[T]) -> usize {
        if self.root.is_empty() {
            return 0;
        }

        let mut removed = Vec::new();
        let shared = common_prefix_len(&self.root.label, prefix);
        if shared == prefix.len() {
            mem::replace(&mut self.root, Branch::empty()).drain_into(&mut removed);
        } else if shared == self.root.label.len() {
            remove_at(&mut self.root, prefix, &mut removed, self.config.aggregation);
            if self.root.is_empty() {
                self.root = Branch::empty();
            } else {
                self.root.collapse();
            }
        }

        self.registry.forget(&removed);
        tracing::debug!(prefix_len = prefix.len(), removed = removed.len(), "removed values");
        removed.len()
    }
}

impl<V: fmt::Debug, T: fmt::Debug> fmt::Display for CompressedPrefixTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_indented(f, 0)
    }
}

impl<V: fmt::Debug, T: fmt::Debug> fmt::Debug for CompressedPrefixTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedPrefixTree")
            .field("aggregation", &self.config.aggregation)
            .field("len", &self.root.len)
            .field("weight", &self.root.weight)
            .finish()
    }
}
