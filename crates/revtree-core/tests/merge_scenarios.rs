//! End-to-end merge scenarios over small hand-built histories.

use revtree_core::{
    ConflictPolicy, Hash, MergeConfig, MergeOutcome, Metadata, Revision, RevisionTree, Value,
};
use std::collections::BTreeSet;

fn content() -> Hash {
    Hash::digest(b"scenario-content")
}

fn meta<const N: usize>(pairs: [(&str, Value); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn tree_of(revs: &[&Revision]) -> RevisionTree {
    revs.iter().map(|r| (*r).clone()).collect()
}

fn hashes(revs: &[&Revision]) -> BTreeSet<Hash> {
    revs.iter().map(|r| r.revision()).collect()
}

fn only_head(tree: &RevisionTree) -> Revision {
    let heads = tree.heads();
    assert_eq!(heads.len(), 1, "expected a single head, got {heads:?}");
    let head = heads.first().copied().unwrap();
    tree.get(&head).unwrap().clone()
}

fn lesser() -> MergeConfig {
    MergeConfig {
        conflict_policy: ConflictPolicy::PreferLesserRevision,
        ..MergeConfig::default()
    }
}

/// a0 → a1 → a2 → a3
///        ↘ b2
struct Greeting {
    a0: Revision,
    a1: Revision,
    a2: Revision,
    a3: Revision,
    b2: Revision,
}

fn greeting() -> Greeting {
    let a0 = Revision::root(content(), 11, meta([("msg", "good morning".into())]));
    let a1 = a0.child(meta([("msg", "hello".into())]));
    let a2 = a1.child(meta([("msg", "hello".into()), ("bool", false.into())]));
    let a3 = a2.child(meta([("msg", "hello world".into()), ("bool", true.into())]));
    let b2 = a1.child(meta([("msg", "hello".into()), ("answer", 42.into())]));
    Greeting { a0, a1, a2, a3, b2 }
}

#[test]
fn linear_chain_heads_and_tails() {
    let g = greeting();
    let tree = tree_of(&[&g.a0, &g.a1, &g.a2, &g.a3]);
    assert_eq!(tree.heads(), hashes(&[&g.a3]));
    assert_eq!(tree.tails(), hashes(&[&g.a0]));
    assert!(tree.unknown_parents().is_empty());
}

#[test]
fn unknown_parents_surface_missing_root() {
    let g = greeting();
    let tree = tree_of(&[&g.a1, &g.a2, &g.a3]);
    assert_eq!(tree.unknown_parents(), hashes(&[&g.a0]));
    assert_eq!(tree.tails(), hashes(&[&g.a1]));
}

#[test]
fn converged_tree_merge_is_identity() {
    let g = greeting();
    let tree = tree_of(&[&g.a0, &g.a1, &g.a2, &g.a3]);
    let (merged, outcome) = tree.merge_outcome(&MergeConfig::default());
    assert_eq!(merged, tree);
    assert_eq!(outcome, MergeOutcome::AlreadyConverged);
}

#[test]
fn incomplete_ancestry_merge_is_identity() {
    let g = greeting();
    let tree = tree_of(&[&g.a3, &g.b2]);
    assert_eq!(tree.heads().len(), 2);
    let (merged, outcome) = tree.merge_outcome(&MergeConfig::default());
    assert_eq!(merged, tree);
    assert!(matches!(outcome, MergeOutcome::IncompleteAncestry { .. }));
    assert_eq!(tree.merge(), tree);
}

#[test]
fn missing_parent_above_common_ancestor_still_merges() {
    let g = greeting();
    let tree = tree_of(&[&g.a1, &g.a2, &g.a3, &g.b2]);
    assert_eq!(tree.heads().len(), 2);

    let (merged, outcome) = tree.merge_outcome(&MergeConfig::default());
    assert!(outcome.is_merged());
    let head = only_head(&merged);
    assert_eq!(head.parents(), &hashes(&[&g.a3, &g.b2]));
    assert_eq!(
        head.metadata(),
        &meta([
            ("answer", 42.into()),
            ("bool", true.into()),
            ("msg", "hello world".into()),
        ])
    );
    assert_eq!(merged.unknown_parents(), hashes(&[&g.a0]));
}

#[test]
fn three_way_merge_combines_both_branches() {
    let g = greeting();
    let tree = tree_of(&[&g.a0, &g.a1, &g.a2, &g.a3, &g.b2]);
    assert_eq!(tree.heads(), hashes(&[&g.a3, &g.b2]));

    let merged = tree.merge();
    let head = only_head(&merged);
    assert_eq!(
        head.metadata(),
        &meta([
            ("answer", 42.into()),
            ("bool", true.into()),
            ("msg", "hello world".into()),
        ])
    );
    assert_eq!(head.parents(), &hashes(&[&g.a3, &g.b2]));
    assert!(!head.is_deleted());
    assert_eq!(head.content(), content());
    assert_eq!(head.length(), 11);
    assert_eq!(merged.len(), tree.len() + 1);
    // No true conflict: the policy does not matter.
    assert_eq!(tree.merge_with(&lesser()), merged);
}

#[test]
fn merge_does_not_modify_receiver() {
    let g = greeting();
    let tree = tree_of(&[&g.a0, &g.a1, &g.a2, &g.a3, &g.b2]);
    let _ = tree.merge();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.heads().len(), 2);
}

#[test]
fn tombstones_merge_to_tombstone() {
    let root = Revision::root(content(), 1, meta([("name", "a".into())]));
    let left = root.child(meta([("name", "b".into())])).tombstone();
    let right = root.child(meta([("name", "c".into())])).tombstone();
    let left_parent = root.child(meta([("name", "b".into())]));
    let right_parent = root.child(meta([("name", "c".into())]));
    let tree = tree_of(&[&root, &left_parent, &right_parent, &left, &right]);

    let head = only_head(&tree.merge());
    assert!(head.is_deleted());
    assert!(head.metadata().is_empty());
}

#[test]
fn deletion_on_one_side_wins_over_untouched_side() {
    let root = Revision::root(content(), 1, meta([("name", "a".into())]));
    let kept = root.child(meta([("name", "a".into()), ("tag", "x".into())]));
    let gone = root.tombstone();
    let tree = tree_of(&[&root, &kept, &gone]);

    let head = only_head(&tree.merge());
    assert!(head.is_deleted());
    // `name` was unchanged on `kept` and removed on `gone`; `tag` only exists on `kept`.
    assert_eq!(head.metadata(), &meta([("tag", "x".into())]));
}

#[test]
fn three_heads_fold_into_one() {
    let root = Revision::root(content(), 1, meta([("x", 0.into())]));
    let h1 = root.child(meta([("x", 0.into()), ("a", 1.into())]));
    let h2 = root.child(meta([("x", 0.into()), ("b", 2.into())]));
    let h3 = root.child(meta([("x", 0.into()), ("c", 3.into())]));
    let tree = tree_of(&[&root, &h1, &h2, &h3]);

    let (merged, outcome) = tree.merge_outcome(&MergeConfig::default());
    let head = only_head(&merged);
    assert_eq!(
        head.metadata(),
        &meta([
            ("a", 1.into()),
            ("b", 2.into()),
            ("c", 3.into()),
            ("x", 0.into()),
        ])
    );
    match outcome {
        MergeOutcome::Merged {
            merged_heads,
            head: reported,
            created,
        } => {
            assert_eq!(merged_heads, hashes(&[&h1, &h2, &h3]));
            assert_eq!(reported, head.revision());
            assert_eq!(created.len(), 2);
            assert_eq!(created.last(), Some(&head.revision()));
        }
        other => panic!("expected a merge, got {other:?}"),
    }
    assert_eq!(merged.len(), tree.len() + 2);
}

/// ```text
///        r{w:1}
///       /      \
///   a1{w:2}   b1{w:1}
///     |  \    /  |
///     |   \  /   |
///     |    \/    |
///     |    /\    |
///   ma{w:2}  mb{w:3}
/// ```
fn criss_cross() -> Vec<Revision> {
    let r = Revision::root(content(), 1, meta([("w", 1.into())]));
    let a1 = r.child(meta([("w", 2.into())]));
    let b1 = r.child(meta([("w", 1.into()), ("side", "b".into())]));
    let parents = [a1.revision(), b1.revision()];
    let ma = Revision::new(
        content(),
        1,
        parents,
        false,
        meta([("w", 2.into()), ("side", "b".into())]),
    );
    let mb = Revision::new(
        content(),
        1,
        parents,
        false,
        meta([("w", 3.into()), ("side", "b".into())]),
    );
    vec![r, a1, b1, ma, mb]
}

#[test]
fn criss_cross_uses_virtual_base() {
    let revs = criss_cross();
    let tree: RevisionTree = revs.iter().cloned().collect();
    assert_eq!(
        revtree_core::dag::lowest_common_ancestors(&tree, &revs[3].revision(), &revs[4].revision())
            .unwrap()
            .len(),
        2
    );

    let expected = meta([("w", 3.into()), ("side", "b".into())]);
    let greater = only_head(&tree.merge());
    let lesser_head = only_head(&tree.merge_with(&lesser()));
    assert_eq!(greater.metadata(), &expected);
    assert_eq!(lesser_head.metadata(), &expected);
    assert_eq!(greater.parents(), &hashes(&[&revs[3], &revs[4]]));
    assert_eq!(tree.merge().len(), tree.len() + 1);
}

#[test]
fn criss_cross_is_order_independent() {
    let revs = criss_cross();
    let forward: RevisionTree = revs.iter().cloned().collect();
    let mut backward = RevisionTree::new();
    for rev in revs.iter().rev() {
        backward = backward.add(rev.clone());
    }
    let f = only_head(&forward.merge());
    let b = only_head(&backward.merge());
    assert_eq!(f.revision(), b.revision());
}

#[test]
fn criss_cross_with_three_bases() {
    //          r
    //       /  |  \
    //      a   b   c
    //      |\ /|\ /|
    //      m1     m2   (each names a, b and c)
    let r = Revision::root(content(), 1, meta([("k", 0.into())]));
    let a = r.child(meta([("k", 0.into()), ("a", true.into())]));
    let b = r.child(meta([("k", 0.into()), ("b", true.into())]));
    let c = r.child(meta([("k", 0.into()), ("c", true.into())]));
    let parents = [a.revision(), b.revision(), c.revision()];
    let all = meta([
        ("a", true.into()),
        ("b", true.into()),
        ("c", true.into()),
        ("k", 0.into()),
    ]);
    let m1 = Revision::new(content(), 1, parents, false, {
        let mut m = all.clone();
        m.insert("k".into(), 1.into());
        m
    });
    let m2 = Revision::new(content(), 1, parents, false, {
        let mut m = all.clone();
        m.insert("z".into(), "new".into());
        m
    });
    let tree = tree_of(&[&r, &a, &b, &c, &m1, &m2]);

    let (merged, outcome) = tree.merge_outcome(&MergeConfig::default());
    assert!(outcome.is_merged());
    let head = only_head(&merged);
    let mut expected = all;
    expected.insert("k".into(), 1.into());
    expected.insert("z".into(), "new".into());
    assert_eq!(head.metadata(), &expected);
    assert_eq!(merged.len(), tree.len() + 1);
}

#[test]
fn true_conflict_is_resolved_by_policy() {
    let root = Revision::root(content(), 1, meta([("color", "red".into())]));
    let blue = root.child(meta([("color", "blue".into())]));
    let green = root.child(meta([("color", "green".into())]));
    let tree = tree_of(&[&root, &blue, &green]);

    let (hi, lo) = if blue.revision() > green.revision() {
        (&blue, &green)
    } else {
        (&green, &blue)
    };
    assert_eq!(only_head(&tree.merge()).metadata(), hi.metadata());
    assert_eq!(only_head(&tree.merge_with(&lesser())).metadata(), lo.metadata());
}

#[test]
fn merged_tree_accepts_further_edits() {
    let g = greeting();
    let tree = tree_of(&[&g.a0, &g.a1, &g.a2, &g.a3, &g.b2]).merge();
    let head = only_head(&tree);
    let next = head.child(meta([("msg", "bye".into())]));
    let tree = tree.add(next.clone());
    assert_eq!(tree.heads(), hashes(&[&next]));
    assert!(tree.is_ancestor(&g.a0.revision(), &next.revision()));
}
