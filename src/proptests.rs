use super::*;

use crate::node::{rank, Branch, Node};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

fn assert_close(got: f64, expected: f64) {
    let tolerance = 1e-9 * got.abs().max(expected.abs()).max(1.0);
    assert!(
        (got - expected).abs() <= tolerance,
        "aggregate {got} differs from recomputed {expected}"
    );
}

fn validate_node<V, T>(
    branch: &Branch<V, T>,
    aggregation: Aggregation,
    backend: Backend,
    seen: &mut HashSet<V>,
) where
    V: Clone + Eq + Hash + fmt::Debug,
    T: PartialEq + fmt::Debug,
{
    assert!(
        !branch.children.is_empty(),
        "reachable node {:?} has no children",
        branch.label
    );
    assert!(branch.weight >= 0.0, "negative weight under {:?}", branch.label);

    for pair in branch.children.windows(2) {
        assert_ne!(
            rank(pair[0].weight(), pair[0].seq(), pair[1].weight(), pair[1].seq()),
            Ordering::Greater,
            "children of {:?} out of order",
            branch.label
        );
    }
    assert_eq!(
        branch.len,
        branch.children.iter().map(Node::len).sum::<usize>(),
        "cached len must match children"
    );
    assert_eq!(
        Some(branch.seq),
        branch.children.iter().map(Node::seq).min(),
        "cached seq must match children"
    );
    assert_close(
        branch.weight,
        aggregation.combine(branch.children.iter().map(|c| (c.weight(), c.len()))),
    );

    if backend == Backend::Compressed {
        assert!(
            !matches!(branch.children.as_slice(), [Node::Branch(_)]),
            "{:?} has a single internal child",
            branch.label
        );
    }

    let depth = branch.label.len();
    let mut next_tokens: Vec<&T> = Vec::new();
    for child in &branch.children {
        match child {
            Node::Leaf(leaf) => {
                assert!(leaf.weight > 0.0);
                assert!(
                    seen.insert(leaf.value.clone()),
                    "{:?} stored twice",
                    leaf.value
                );
            }
            Node::Branch(inner) => {
                assert!(inner.label.starts_with(&branch.label));
                match backend {
                    Backend::Simple => assert_eq!(inner.label.len(), depth + 1),
                    Backend::Compressed => assert!(inner.label.len() > depth),
                }
                let token = &inner.label[depth];
                assert!(
                    !next_tokens.contains(&token),
                    "siblings under {:?} share {token:?}",
                    branch.label
                );
                next_tokens.push(token);
                validate_node(inner, aggregation, backend, seen);
            }
        }
    }
}

fn validate_root<V, T>(root: &Branch<V, T>, aggregation: Aggregation, backend: Backend, registered: usize)
where
    V: Clone + Eq + Hash + fmt::Debug,
    T: PartialEq + fmt::Debug,
{
    if root.is_empty() {
        assert_eq!(root.len, 0);
        assert_eq!(root.weight, 0.0);
        assert!(root.label.is_empty(), "empty root must have an empty label");
        assert_eq!(registered, 0, "registry must be empty with the tree");
        return;
    }

    let mut seen = HashSet::new();
    validate_node(root, aggregation, backend, &mut seen);
    assert_eq!(seen.len(), root.len, "reachable leaves must match len");
    assert_eq!(registered, root.len, "registry must track every stored value");
}

fn validate_simple<V, T>(t: &SimplePrefixTree<V, T>)
where
    V: Clone + Eq + Hash + fmt::Debug,
    T: PartialEq + fmt::Debug,
{
    assert!(t.root().label.is_empty(), "simple root label must be empty");
    validate_root(t.root(), t.config().aggregation, Backend::Simple, t.registry().len());
}

fn validate_compressed<V, T>(t: &CompressedPrefixTree<V, T>)
where
    V: Clone + Eq + Hash + fmt::Debug,
    T: PartialEq + fmt::Debug,
{
    validate_root(
        t.root(),
        t.config().aggregation,
        Backend::Compressed,
        t.registry().len(),
    );
}

/// Flat list of stored values, searched linearly.
#[derive(Clone, Debug)]
struct Model<V, T> {
    entries: Vec<(V, f64, Vec<T>, u64)>,
    next_seq: u64,
}

impl<V: Clone + PartialEq, T: Clone + PartialEq> Model<V, T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, value: V, weight: f64, prefix: &[T]) -> Result<()> {
        if !(weight > 0.0) {
            return Err(Error::InvalidWeight(weight));
        }
        match self.entries.iter_mut().find(|e| e.0 == value) {
            Some(e) if e.2 != prefix => Err(Error::PrefixMismatch {
                stored_len: e.2.len(),
                given_len: prefix.len(),
            }),
            Some(e) => {
                e.1 += weight;
                Ok(())
            }
            None => {
                self.entries.push((value, weight, prefix.to_vec(), self.next_seq));
                self.next_seq += 1;
                Ok(())
            }
        }
    }

    fn autocomplete(&self, prefix: &[T], limit: Option<usize>) -> Result<Vec<(V, f64)>> {
        if limit == Some(0) {
            return Err(Error::InvalidLimit);
        }
        let mut found: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.2.starts_with(prefix))
            .collect();
        found.sort_by(|a, b| rank(a.1, a.3, b.1, b.3));
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        Ok(found.into_iter().map(|e| (e.0.clone(), e.1)).collect())
    }

    fn remove(&mut self, prefix: &[T]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.2.starts_with(prefix));
        before - self.entries.len()
    }
}

fn owned<V: Clone>(results: Result<Vec<(&V, f64)>>) -> Result<Vec<(V, f64)>> {
    results.map(|r| r.into_iter().map(|(v, w)| (v.clone(), w)).collect())
}

#[derive(Clone, Debug)]
enum Op {
    /// Value, weight, and an explicit prefix or `None` for the value's own.
    Insert(u8, u8, Option<Vec<u8>>),
    Remove(Vec<u8>),
    Autocomplete(Vec<u8>, Option<usize>),
}

/// Base-3 digits of `value`, most significant first. Zero maps to the empty
/// prefix, and values share prefixes the way their digits do.
fn own_prefix(mut value: u8) -> Vec<u8> {
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(value % 3);
        value /= 3;
    }
    digits.reverse();
    digits
}

fn prefix_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A three-token alphabet keeps prefixes colliding.
    prop::collection::vec(0u8..3, 0..=4)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let prefix = prefix_strategy();
    let op = prop_oneof![
        50 => (0u8..16, 0u8..=8, prop::option::weighted(0.2, prefix.clone()))
            .prop_map(|(v, w, p)| Op::Insert(v, w, p)),
        15 => prefix.clone().prop_map(Op::Remove),
        35 => (prefix.clone(), prop::option::of(0usize..=4))
            .prop_map(|(p, l)| Op::Autocomplete(p, l)),
    ];
    prop::collection::vec(op, 0..=300)
}

fn run_ops<A>(t: &mut A, ops: &[Op], validate: impl Fn(&A)) -> Result<(), TestCaseError>
where
    A: Autocompleter<u8, u8>,
{
    let mut m: Model<u8, u8> = Model::new();
    for op in ops {
        match op {
            Op::Insert(value, weight, prefix) => {
                let prefix = prefix.clone().unwrap_or_else(|| own_prefix(*value));
                let weight = f64::from(*weight);
                prop_assert_eq!(
                    t.insert(*value, weight, &prefix),
                    m.insert(*value, weight, &prefix)
                );
            }
            Op::Remove(prefix) => {
                prop_assert_eq!(t.remove(prefix), m.remove(prefix));
            }
            Op::Autocomplete(prefix, limit) => {
                prop_assert_eq!(
                    owned(t.autocomplete(prefix, *limit)),
                    m.autocomplete(prefix, *limit)
                );
            }
        }

        prop_assert_eq!(t.len(), m.len());
        validate(&*t);
    }

    prop_assert_eq!(owned(t.autocomplete(&[], None)), m.autocomplete(&[], None));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_simple_matches_model(aggregation in any::<Aggregation>(), ops in ops_strategy()) {
        let mut t = SimplePrefixTree::new(aggregation);
        run_ops(&mut t, &ops, |t| validate_simple(t))?;
    }

    #[test]
    fn prop_compressed_matches_model(aggregation in any::<Aggregation>(), ops in ops_strategy()) {
        let mut t = CompressedPrefixTree::new(aggregation);
        run_ops(&mut t, &ops, |t| validate_compressed(t))?;
    }

    #[test]
    fn prop_backends_agree(aggregation in any::<Aggregation>(), ops in ops_strategy()) {
        let mut s = SimplePrefixTree::new(aggregation);
        let mut c = CompressedPrefixTree::new(aggregation);

        for op in &ops {
            match op {
                Op::Insert(value, weight, prefix) => {
                    let prefix = prefix.clone().unwrap_or_else(|| own_prefix(*value));
                    let weight = f64::from(*weight);
                    prop_assert_eq!(s.insert(*value, weight, &prefix), c.insert(*value, weight, &prefix));
                }
                Op::Remove(prefix) => {
                    prop_assert_eq!(s.remove(prefix), c.remove(prefix));
                }
                Op::Autocomplete(prefix, limit) => {
                    prop_assert_eq!(s.autocomplete(prefix, *limit), c.autocomplete(prefix, *limit));
                }
            }
        }

        prop_assert_eq!(s.autocomplete(&[], None), c.autocomplete(&[], None));
        let tolerance = 1e-9 * s.weight().abs().max(1.0);
        prop_assert!((s.weight() - c.weight()).abs() <= tolerance);
    }

    #[test]
    fn prop_reinsert_accumulates(
        backend in any::<Backend>(),
        value in 0u8..16,
        first in 1u8..=50,
        second in 1u8..=50,
    ) {
        let mut t = backend.build::<u8, u8>(Config::default());
        let prefix = own_prefix(value);
        t.insert(value, f64::from(first), &prefix).unwrap();
        t.insert(value, f64::from(second), &prefix).unwrap();

        prop_assert_eq!(t.len(), 1);
        prop_assert_eq!(
            t.autocomplete(&prefix, None).unwrap(),
            vec![(&value, f64::from(first) + f64::from(second))]
        );
    }

    #[test]
    fn prop_remove_takes_exactly_the_matches(
        backend in any::<Backend>(),
        ops in ops_strategy(),
        query in prefix_strategy(),
    ) {
        let mut t = backend.build::<u8, u8>(Config::default());
        for op in &ops {
            if let Op::Insert(value, weight, prefix) = op {
                let prefix = prefix.clone().unwrap_or_else(|| own_prefix(*value));
                let _ = t.insert(*value, f64::from(*weight), &prefix);
            }
        }

        let matching: Vec<u8> = t.autocomplete(&query, None).unwrap().into_iter().map(|(v, _)| *v).collect();
        let before = t.len();
        prop_assert_eq!(t.remove(&query), matching.len());
        prop_assert_eq!(t.len(), before - matching.len());
        prop_assert!(t.autocomplete(&query, None).unwrap().is_empty());

        let rest = t.autocomplete(&[], None).unwrap();
        prop_assert_eq!(rest.len(), t.len());
        prop_assert!(rest.iter().all(|(v, _)| !matching.contains(*v)));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const WORDS: [&str; 6] = ["a", "b", "ab", "abc", "abd", "ba"];

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Powers of two, so no two disjoint groups of words weigh the same and
/// sibling order never depends on insertion order.
fn weighted_words() -> Vec<(&'static str, f64)> {
    WORDS
        .iter()
        .enumerate()
        .map(|(i, w)| (*w, f64::from(1u32 << i)))
        .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let mut layout: Option<(String, String)> = None;

    for_each_permutation(&weighted_words(), |perm| {
        let mut s = SimplePrefixTree::new(Aggregation::Sum);
        let mut c = CompressedPrefixTree::new(Aggregation::Sum);
        for (word, weight) in &perm {
            s.insert(*word, *weight, &chars(word)).unwrap();
            c.insert(*word, *weight, &chars(word)).unwrap();
        }

        validate_simple(&s);
        validate_compressed(&c);
        assert_eq!(s.autocomplete(&[], None).unwrap(), c.autocomplete(&[], None).unwrap());

        let dump = (s.to_string(), c.to_string());
        let first = layout.get_or_insert_with(|| dump.clone());
        assert_eq!(*first, dump, "layout depends on insertion order");
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let queries: Vec<Vec<char>> = ["abc", "ab", "a", "ba", "b", "x"].iter().map(|q| chars(q)).collect();

    let mut base_simple = SimplePrefixTree::new(Aggregation::Average);
    let mut base_compressed = CompressedPrefixTree::new(Aggregation::Average);
    let mut base_model = Model::new();
    for (word, weight) in weighted_words() {
        base_simple.insert(word, weight, &chars(word)).unwrap();
        base_compressed.insert(word, weight, &chars(word)).unwrap();
        base_model.insert(word, weight, &chars(word)).unwrap();
    }

    for_each_permutation(&queries, |perm| {
        let mut s = base_simple.clone();
        let mut c = base_compressed.clone();
        let mut m = base_model.clone();

        for query in perm {
            let expected = m.remove(&query);
            assert_eq!(s.remove(&query), expected);
            assert_eq!(c.remove(&query), expected);
            validate_simple(&s);
            validate_compressed(&c);

            let all = m.autocomplete(&[], None);
            assert_eq!(owned(s.autocomplete(&[], None)), all);
            assert_eq!(owned(c.autocomplete(&[], None)), all);
        }

        assert!(s.is_empty());
        assert!(c.is_empty());
        assert_eq!(c.node_count(), 0);
    });
}

#[test]
fn randomized_words_both_backends() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for aggregation in [Aggregation::Sum, Aggregation::Average] {
        let mut s = SimplePrefixTree::new(aggregation);
        let mut c = CompressedPrefixTree::new(aggregation);
        let mut m = Model::new();

        for _ in 0..5_000 {
            let len = rng.gen_range(0..=6);
            let word: String = (0..len).map(|_| rng.gen_range(b'a'..=b'd') as char).collect();
            let prefix = chars(&word);

            match rng.gen_range(0u32..10) {
                0 => {
                    let query = &prefix[..rng.gen_range(0..=prefix.len())];
                    let expected = m.remove(query);
                    assert_eq!(s.remove(query), expected);
                    assert_eq!(c.remove(query), expected);
                }
                1..=3 => {
                    let limit = Some(rng.gen_range(1..=5));
                    let expected = m.autocomplete(&prefix, limit);
                    assert_eq!(owned(s.autocomplete(&prefix, limit)), expected);
                    assert_eq!(owned(c.autocomplete(&prefix, limit)), expected);
                }
                _ => {
                    let weight = f64::from(rng.gen_range(1u32..=9));
                    m.insert(word.clone(), weight, &prefix).unwrap();
                    s.insert(word.clone(), weight, &prefix).unwrap();
                    c.insert(word, weight, &prefix).unwrap();
                }
            }
        }

        validate_simple(&s);
        validate_compressed(&c);
        assert_eq!(s.len(), m.len());
        assert_eq!(c.len(), m.len());
        assert_close(c.weight(), s.weight());
    }
}
