//! Node representation shared by both prefix trees.
//!
//! Labels are absolute: an internal node's label is the whole prefix leading
//! to it, not the edge from its parent. A leaf carries no label; the full
//! prefix of its value is the label of the node it hangs from.

use std::cmp::Ordering;
use std::fmt;

use crate::{Aggregation, Error, Result};

/// A stored value and its accumulated weight.
#[derive(Clone, Debug)]
pub(crate) struct Leaf<V> {
    pub(crate) value: V,
    pub(crate) weight: f64,
    /// Insertion sequence number, used to break weight ties.
    pub(crate) seq: u64,
}

/// An internal node.
///
/// `weight`, `len` and `seq` are caches over `children`, kept current by
/// [`Branch::refresh`].
#[derive(Clone, Debug)]
pub(crate) struct Branch<V, T> {
    pub(crate) label: Vec<T>,
    pub(crate) weight: f64,
    /// Number of leaves below this node.
    pub(crate) len: usize,
    /// Smallest leaf sequence number below this node.
    pub(crate) seq: u64,
    pub(crate) children: Vec<Node<V, T>>,
}

#[derive(Clone, Debug)]
pub(crate) enum Node<V, T> {
    Leaf(Leaf<V>),
    Branch(Branch<V, T>),
}

impl<V, T> Node<V, T> {
    #[inline]
    pub(crate) fn weight(&self) -> f64 {
        match self {
            Node::Leaf(leaf) => leaf.weight,
            Node::Branch(branch) => branch.weight,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Branch(branch) => branch.len,
        }
    }

    #[inline]
    pub(crate) fn seq(&self) -> u64 {
        match self {
            Node::Leaf(leaf) => leaf.seq,
            Node::Branch(branch) => branch.seq,
        }
    }

    #[inline]
    pub(crate) fn as_branch(&self) -> Option<&Branch<V, T>> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }

    #[inline]
    pub(crate) fn as_branch_mut(&mut self) -> Option<&mut Branch<V, T>> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }

    fn drain_into(self, out: &mut Vec<V>) {
        match self {
            Node::Leaf(leaf) => out.push(leaf.value),
            Node::Branch(branch) => branch.drain_into(out),
        }
    }
}

/// Heavier first; equal weights fall back to insertion order.
#[inline]
pub(crate) fn rank(weight_a: f64, seq_a: u64, weight_b: f64, seq_b: u64) -> Ordering {
    weight_b.total_cmp(&weight_a).then(seq_a.cmp(&seq_b))
}

impl<V, T> Branch<V, T> {
    /// The empty node: no label, no children, zero weight.
    pub(crate) fn empty() -> Self {
        Self::with_label(Vec::new())
    }

    pub(crate) fn with_label(label: Vec<T>) -> Self {
        Self {
            label,
            weight: 0.0,
            len: 0,
            seq: u64::MAX,
            children: Vec::new(),
        }
    }

    /// A node holding exactly one value whose full prefix is `label`.
    pub(crate) fn holding(label: Vec<T>, leaf: Leaf<V>, aggregation: Aggregation) -> Self {
        let mut branch = Self::with_label(label);
        branch.children.push(Node::Leaf(leaf));
        branch.refresh(aggregation);
        branch
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Restore child order and recompute the cached aggregates.
    pub(crate) fn refresh(&mut self, aggregation: Aggregation) {
        self.children
            .sort_by(|a, b| rank(a.weight(), a.seq(), b.weight(), b.seq()));
        self.len = self.children.iter().map(Node::len).sum();
        self.seq = self.children.iter().map(Node::seq).min().unwrap_or(u64::MAX);
        self.weight = aggregation.combine(self.children.iter().map(|c| (c.weight(), c.len())));
    }

    /// The leaf directly under this node that stores `value`, if any.
    pub(crate) fn leaf_mut(&mut self, value: &V) -> Option<&mut Leaf<V>>
    where
        V: PartialEq,
    {
        self.children.iter_mut().find_map(|child| match child {
            Node::Leaf(leaf) if leaf.value == *value => Some(leaf),
            _ => None,
        })
    }

    /// Add `leaf`'s weight to an equal value under this node, or adopt it.
    pub(crate) fn merge_leaf(&mut self, leaf: Leaf<V>)
    where
        V: PartialEq,
    {
        match self.leaf_mut(&leaf.value) {
            Some(existing) => existing.weight += leaf.weight,
            None => {
                tracing::trace!(prefix_len = self.label.len(), "new leaf");
                self.children.push(Node::Leaf(leaf));
            }
        }
    }

    /// Replace a node whose only child is another internal node by that
    /// child. Returns whether anything changed.
    pub(crate) fn collapse(&mut self) -> bool {
        let only = match self.children.as_mut_slice() {
            [Node::Branch(only)] => std::mem::replace(only, Branch::empty()),
            _ => return false,
        };
        tracing::trace!(
            from = self.label.len(),
            to = only.label.len(),
            "collapsing single-child node"
        );
        *self = only;
        true
    }

    /// Every leaf below this node.
    pub(crate) fn collect<'a>(&'a self, out: &mut Vec<Match<'a, V>>) {
        let mut stack = vec![self];
        while let Some(branch) = stack.pop() {
            for child in &branch.children {
                match child {
                    Node::Leaf(leaf) => out.push(Match {
                        value: &leaf.value,
                        weight: leaf.weight,
                        seq: leaf.seq,
                    }),
                    Node::Branch(inner) => stack.push(inner),
                }
            }
        }
    }

    /// Move every value out of this subtree.
    pub(crate) fn drain_into(self, out: &mut Vec<V>) {
        for child in self.children {
            child.drain_into(out);
        }
    }

    /// Remove child `idx` and move its values into `out`.
    pub(crate) fn discard_child(&mut self, idx: usize, out: &mut Vec<V>) {
        self.children.remove(idx).drain_into(out);
    }
}

impl<V: fmt::Debug, T: fmt::Debug> Branch<V, T> {
    /// Indented dump, two spaces per level. Empty nodes print nothing.
    pub(crate) fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        writeln!(f, "{:indent$}{:?} ({})", "", self.label, self.weight, indent = depth * 2)?;
        for child in &self.children {
            match child {
                Node::Leaf(leaf) => writeln!(
                    f,
                    "{:indent$}{:?} ({})",
                    "",
                    leaf.value,
                    leaf.weight,
                    indent = (depth + 1) * 2
                )?,
                Node::Branch(branch) => branch.write_indented(f, depth + 1)?,
            }
        }
        Ok(())
    }
}

/// A value found by `autocomplete`, before ranking.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Match<'a, V> {
    pub(crate) value: &'a V,
    pub(crate) weight: f64,
    pub(crate) seq: u64,
}

/// Sort matches by rank and keep at most `limit` of them.
///
/// The traversal that produced `matches` only orders siblings locally, so the
/// whole set is sorted before truncating.
pub(crate) fn rank_matches<'a, V>(
    mut matches: Vec<Match<'a, V>>,
    limit: Option<usize>,
) -> Vec<(&'a V, f64)> {
    matches.sort_by(|a, b| rank(a.weight, a.seq, b.weight, b.seq));
    if let Some(limit) = limit {
        matches.truncate(limit);
    }
    matches.into_iter().map(|m| (m.value, m.weight)).collect()
}

pub(crate) fn check_limit(limit: Option<usize>) -> Result<()> {
    match limit {
        Some(0) => Err(Error::InvalidLimit),
        _ => Ok(()),
    }
}

/// Number of leading tokens `a` and `b` have in common.
#[inline]
pub(crate) fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
