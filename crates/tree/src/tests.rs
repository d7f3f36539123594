// Path: crates/tree/src/tests.rs

use super::*;
use pact_crypto::hash::{node_hash, sha256};
use proptest::prelude::*;

fn leaf(n: u64) -> [u8; 32] {
    sha256(&n.to_be_bytes())
}

fn tree_with(n: u64) -> MerkleTree {
    MerkleTree::from_leaves((0..n).map(leaf)).unwrap()
}

#[test]
fn empty_tree_has_no_root() {
    let tree = MerkleTree::new();
    assert_eq!(tree.leaf_count(), 0);
    assert_eq!(tree.root(), None);
}

#[test]
fn single_leaf_root_is_the_leaf() {
    let tree = tree_with(1);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.root(), Some(leaf(0)));

    let proof = tree.prove(0).unwrap();
    assert!(proof.siblings.is_empty());
    assert_eq!(proof.leaf_hash, proof.root_hash);
    assert!(verify_inclusion(&proof));
}

#[test]
fn three_leaves_duplicate_the_odd_tail() {
    let tree = tree_with(3);
    let (h0, h1, h2) = (leaf(0), leaf(1), leaf(2));
    let expected = node_hash(&node_hash(&h0, &h1), &node_hash(&h2, &h2));
    assert_eq!(tree.root(), Some(expected));

    for i in 0..3 {
        assert!(verify_inclusion(&tree.prove(i).unwrap()));
    }
}

#[test]
fn all_proofs_verify_across_shapes() {
    for n in [1u64, 2, 3, 4, 5, 7, 8, 16, 17] {
        let tree = tree_with(n);
        let root_hex = hex::encode(tree.root().unwrap());
        for i in 0..n {
            let proof = tree.prove(i).unwrap();
            assert_eq!(proof.root_hash, root_hex, "n={n} i={i}");
            assert!(verify_inclusion(&proof), "n={n} i={i}");
        }
    }
}

#[test]
fn append_order_changes_the_root() {
    let forward = MerkleTree::from_leaves([leaf(0), leaf(1)]).unwrap();
    let reversed = MerkleTree::from_leaves([leaf(1), leaf(0)]).unwrap();
    assert_ne!(forward.root(), reversed.root());
}

#[test]
fn proof_for_out_of_range_leaf_is_an_error() {
    let tree = tree_with(3);
    assert!(matches!(
        tree.prove(3),
        Err(pact_types::error::TreeError::LeafOutOfRange { index: 3, count: 3 })
    ));
}

#[test]
fn tampered_proofs_fail() {
    let tree = tree_with(7);
    let proof = tree.prove(4).unwrap();
    assert!(verify_inclusion(&proof));

    let flip_nibble = |s: &str| {
        let mut chars: Vec<char> = s.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        chars.into_iter().collect::<String>()
    };

    let mut bad = proof.clone();
    bad.leaf_hash = flip_nibble(&bad.leaf_hash);
    assert!(!verify_inclusion(&bad));

    let mut bad = proof.clone();
    bad.root_hash = flip_nibble(&bad.root_hash);
    assert!(!verify_inclusion(&bad));

    let mut bad = proof.clone();
    bad.siblings[1].hash = flip_nibble(&bad.siblings[1].hash);
    assert!(!verify_inclusion(&bad));

    let mut bad = proof.clone();
    bad.siblings[0].position = match bad.siblings[0].position {
        SiblingPosition::Left => SiblingPosition::Right,
        SiblingPosition::Right => SiblingPosition::Left,
    };
    assert!(!verify_inclusion(&bad));
}

#[test]
fn malformed_hex_fails_closed() {
    let tree = tree_with(2);
    let mut proof = tree.prove(0).unwrap();
    proof.siblings[0].hash = "zz".repeat(32);
    assert!(!verify_inclusion(&proof));

    let mut proof = tree.prove(0).unwrap();
    proof.leaf_hash.truncate(60);
    assert!(!verify_inclusion(&proof));
}

#[test]
fn plan_append_does_not_mutate() {
    let tree = tree_with(4);
    let before = tree.root();
    let plan = tree.plan_append(leaf(4)).unwrap();
    assert_eq!(tree.root(), before);
    assert_eq!(tree.leaf_count(), 4);
    assert_eq!(plan.leaf_index, 4);
    assert_eq!(plan.leaf_count, 5);

    let mut applied = tree.clone();
    applied.apply(&plan);
    assert_eq!(applied.root(), Some(plan.root));
    assert_eq!(applied.leaf_count(), 5);
}

#[test]
fn plan_nodes_cover_the_whole_path() {
    // Appending the 5th leaf grows the height from 2 to 3: the plan must
    // write the leaf, a duplicated pair at each intermediate level, and
    // the new root.
    let tree = tree_with(4);
    let plan = tree.plan_append(leaf(4)).unwrap();
    let coords: Vec<(u32, u64)> = plan.nodes.iter().map(|w| (w.level, w.index)).collect();
    assert_eq!(coords, vec![(0, 4), (1, 2), (2, 1), (3, 0)]);
}

#[test]
fn replay_reproduces_incremental_root() {
    let mut incremental = MerkleTree::new();
    for i in 0..17 {
        incremental.append(leaf(i)).unwrap();
    }
    let replayed = tree_with(17);
    assert_eq!(incremental.root(), replayed.root());
    assert_eq!(incremental.height(), replayed.height());
}

proptest! {
    #[test]
    fn proofs_verify_for_random_tree_sizes(n in 1u64..64, seed in any::<u64>()) {
        let tree = MerkleTree::from_leaves(
            (0..n).map(|i| sha256(&(seed ^ i).to_le_bytes())),
        ).unwrap();

        for i in 0..n {
            let proof = tree.prove(i).unwrap();
            prop_assert!(verify_inclusion(&proof));
            prop_assert_eq!(&proof.root_hash, &hex::encode(tree.root().unwrap()));
        }
    }

    #[test]
    fn distinct_leaf_sets_give_distinct_roots(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        let t1 = MerkleTree::from_leaves([sha256(&a.to_le_bytes())]).unwrap();
        let t2 = MerkleTree::from_leaves([sha256(&b.to_le_bytes())]).unwrap();
        prop_assert_ne!(t1.root(), t2.root());
    }
}
