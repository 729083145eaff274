//! Uncompressed prefix tree: one internal node per token.
//!
//! Every internal node's label extends its parent's by exactly one token, so
//! depth equals prefix length. The root's label is always empty.

use std::fmt;
use std::hash::Hash;

use crate::node::{check_limit, rank_matches, Branch, Leaf, Match, Node};
use crate::registry::Registry;
use crate::{Aggregation, Autocompleter, Config, Result};

/// A prefix tree with one internal node per prefix token.
#[derive(Clone)]
pub struct SimplePrefixTree<V, T> {
    root: Branch<V, T>,
    config: Config,
    registry: Registry<V, T>,
}

impl<V, T> SimplePrefixTree<V, T> {
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

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Branch<V, T> {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry<V, T> {
        &self.registry
    }
}

impl<V, T> Default for SimplePrefixTree<V, T> {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<V: Clone + Eq + Hash, T: Clone + Eq> SimplePrefixTree<V, T> {
    /// Whether `value` is stored anywhere in the tree.
    pub fn contains(&self, value: &V) -> bool {
        self.registry.contains(value)
    }
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
        let token = &prefix[depth];
        let existing = node
            .children
            .iter()
            .position(|child| child.as_branch().is_some_and(|b| b.label.last() == Some(token)));
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let child = Branch::with_label(prefix[..=depth].to_vec());
                node.children.push(Node::Branch(child));
                node.children.len() - 1
            }
        };
        if let Some(child) = node.children[idx].as_branch_mut() {
            insert_at(child, leaf, prefix, aggregation);
        }
    }
    node.refresh(aggregation);
}

/// Gather every leaf under `node` matching `query`. `node`'s label is a
/// prefix of `query` or extends it.
fn collect_matches<'a, V, T: PartialEq>(
    node: &'a Branch<V, T>,
    query: &[T],
    out: &mut Vec<Match<'a, V>>,
) {
    let depth = node.label.len();
    if query.len() <= depth {
        node.collect(out);
        return;
    }
    let token = &query[depth];
    if let Some(child) = node
        .children
        .iter()
        .filter_map(|child| child.as_branch())
        .find(|b| b.label.last() == Some(token))
    {
        collect_matches(child, query, out);
    }
}

/// Remove every value under `node` matching `prefix`, which strictly extends
/// `node`'s label.
fn remove_at<V, T: PartialEq>(
    node: &mut Branch<V, T>,
    prefix: &[T],
    removed: &mut Vec<V>,
    aggregation: Aggregation,
) {
    let depth = node.label.len();
    let token = &prefix[depth];
    let Some(idx) = node
        .children
        .iter()
        .position(|child| child.as_branch().is_some_and(|b| b.label.last() == Some(token)))
    else {
        return;
    };

    if depth + 1 == prefix.len() {
        node.discard_child(idx, removed);
    } else if let Some(child) = node.children[idx].as_branch_mut() {
        remove_at(child, prefix, removed, aggregation);
        if child.is_empty() {
            node.children.remove(idx);
        }
    }
    node.refresh(aggregation);
}

impl<V: Clone + Eq + Hash, T: Clone + Eq> Autocompleter<V, T> for SimplePrefixTree<V, T> {
    fn len(&self) -> usize {
        self.root.len
    }

    fn insert(&mut self, value: V, weight: f64, prefix: &[T]) -> Result<()> {
        let seq = self
            .registry
            .admit(&value, weight, prefix, self.config.max_prefix_len)?;
        let leaf = Leaf { value, weight, seq };
        insert_at(&mut self.root, leaf, prefix, self.config.aggregation);
        Ok(())
    }

    fn autocomplete(&self, prefix: &[T], limit: Option<usize>) -> Result<Vec<(&V, f64)>> {
        check_limit(limit)?;
        let mut matches = Vec::new();
        collect_matches(&self.root, prefix, &mut matches);
        Ok(rank_matches(matches, limit))
    }

    fn remove(&mut self, prefix: &[T]) -> usize {
        let mut removed = Vec::new();
        if prefix.is_empty() {
            std::mem::replace(&mut self.root, Branch::empty()).drain_into(&mut removed);
        } else {
            remove_at(&mut self.root, prefix, &mut removed, self.config.aggregation);
        }
        self.registry.forget(&removed);
        tracing::debug!(prefix_len = prefix.len(), removed = removed.len(), "removed values");
        removed.len()
    }
}

impl<V: fmt::Debug, T: fmt::Debug> fmt::Display for SimplePrefixTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_indented(f, 0)
    }
}

impl<V: fmt::Debug, T: fmt::Debug> fmt::Debug for SimplePrefixTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplePrefixTree")
            .field("aggregation", &self.config.aggregation)
            .field("len", &self.root.len)
            .field("weight", &self.root.weight)
            .finish()
    }
}
