// Path: crates/store/tests/anchor_tests.rs
//! Anchor engine behaviour: payload layout, the anchor chain, binding,
//! and proof production.

use pact_crypto::hash::node_hash;
use pact_store::wallet::{ChainView, ConfirmationStatus, NoWallet, WalletBroadcaster};
use pact_store::{AnchorOptions, AnchorOutcome, CommitmentStore};
use pact_types::error::{AnchorError, ExternalError, StoreError};
use pact_types::{CommitmentPayload, CommitmentType};

fn payload(subject: &str) -> CommitmentPayload {
    CommitmentPayload::new(subject, "content")
}

fn txid(byte: u8) -> String {
    format!("{byte:02x}").repeat(32)
}

struct MockWallet {
    txid: String,
}

impl WalletBroadcaster for MockWallet {
    fn broadcast_anchor(
        &self,
        payload: &[u8],
        _fee_rate: Option<f64>,
    ) -> Result<String, ExternalError> {
        assert_eq!(payload.len(), 79);
        Ok(self.txid.clone())
    }
}

struct StaticChain(ConfirmationStatus);

impl ChainView for StaticChain {
    fn confirmation(&self, _txid: &str) -> Result<ConfirmationStatus, ExternalError> {
        Ok(self.0)
    }
}

fn open_store() -> (tempfile::TempDir, CommitmentStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = CommitmentStore::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn payload_assembly_refuses_an_empty_tree() {
    let (_dir, store) = open_store();
    assert!(matches!(
        store.build_anchor_payload(),
        Err(StoreError::Anchor(AnchorError::EmptyTree))
    ));
}

#[test]
fn payload_bytes_follow_the_fixed_layout() {
    let (_dir, mut store) = open_store();
    for i in 0..3 {
        store
            .commit(CommitmentType::State, payload(&format!("s{i}")))
            .unwrap();
    }

    let bytes = store.build_anchor_payload().unwrap().to_bytes();
    assert_eq!(bytes.len(), 79);
    assert_eq!(&bytes[..10], b"BSV-ANCHOR");
    assert_eq!(bytes[10], 0x01);
    assert_eq!(hex::encode(&bytes[11..43]), store.root_hash().unwrap());
    assert_eq!(&bytes[43..47], &[0, 0, 0, 3]);
    assert_eq!(&bytes[47..79], &[0u8; 32]);
}

#[test]
fn second_payload_links_to_the_previous_anchor() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    store.record_anchor(&txid(0x77), None).unwrap();
    store.commit(CommitmentType::State, payload("b")).unwrap();

    let bytes = store.build_anchor_payload().unwrap().to_bytes();
    assert_eq!(hex::encode(&bytes[47..79]), txid(0x77));
    assert_eq!(&bytes[43..47], &[0, 0, 0, 2]);
}

#[test]
fn payload_assembly_refuses_when_nothing_is_new() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    store.record_anchor(&txid(0x10), None).unwrap();

    assert!(matches!(
        store.build_anchor_payload(),
        Err(StoreError::Anchor(AnchorError::NothingNew(0)))
    ));
}

#[test]
fn anchor_chain_links_and_counts_monotonically() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    let first = store.record_anchor(&txid(0x01), None).unwrap();
    store.commit(CommitmentType::State, payload("b")).unwrap();
    let second = store.record_anchor(&txid(0x02), None).unwrap();

    assert_eq!(first.anchor_index, 0);
    assert_eq!(first.previous_anchor, None);
    assert_eq!(first.commitment_count, 1);
    assert_eq!(second.anchor_index, 1);
    assert_eq!(second.previous_anchor.as_deref(), Some(txid(0x01).as_str()));
    assert_eq!(second.commitment_count, 2);

    let listed = store.list_anchors().unwrap();
    assert_eq!(listed, vec![first, second.clone()]);
    assert_eq!(store.latest_anchor().unwrap(), Some(second));
}

#[test]
fn duplicate_txid_is_an_integrity_error() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    store.record_anchor(&txid(0x05), None).unwrap();
    store.commit(CommitmentType::State, payload("b")).unwrap();

    assert!(matches!(
        store.record_anchor(&txid(0x05), None),
        Err(StoreError::Anchor(AnchorError::DuplicateTxid(_)))
    ));
}

#[test]
fn malformed_txid_is_rejected() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    assert!(store.record_anchor("not-hex", None).is_err());
    assert!(store.record_anchor(&"ab".repeat(16), None).is_err());
    assert_eq!(store.latest_anchor().unwrap(), None);
}

#[test]
fn proofs_bind_to_the_earliest_covering_anchor() {
    let (_dir, mut store) = open_store();

    let mut early = Vec::new();
    for i in 0..3 {
        early.push(
            store
                .commit(CommitmentType::State, payload(&format!("early{i}")))
                .unwrap()
                .id,
        );
    }
    store.record_anchor(&txid(0xA1), None).unwrap();

    let mut late = Vec::new();
    for i in 0..2 {
        late.push(
            store
                .commit(CommitmentType::State, payload(&format!("late{i}")))
                .unwrap()
                .id,
        );
    }
    store.record_anchor(&txid(0xA2), None).unwrap();

    for id in &early {
        let bundle = store.prove(id).unwrap().unwrap();
        assert_eq!(bundle.anchor.txid, txid(0xA1));
        assert!(CommitmentStore::verify_bundle(&bundle, None));
    }
    for id in &late {
        let bundle = store.prove(id).unwrap().unwrap();
        assert_eq!(bundle.anchor.txid, txid(0xA2));
        assert!(CommitmentStore::verify_bundle(&bundle, None));
    }
}

#[test]
fn unanchored_commitments_cannot_be_proven() {
    let (_dir, mut store) = open_store();
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(
            store
                .commit(CommitmentType::State, payload(&format!("s{i}")))
                .unwrap()
                .id,
        );
    }

    assert_eq!(store.unanchored_count().unwrap(), 3);
    for id in &ids {
        assert!(store.prove(id).unwrap().is_none());
    }

    store.record_anchor(&txid(0xB0), None).unwrap();
    assert_eq!(store.unanchored_count().unwrap(), 0);
    for id in &ids {
        let bundle = store.prove(id).unwrap().unwrap();
        assert_eq!(bundle.anchor.txid, txid(0xB0));
        assert!(CommitmentStore::verify_bundle(&bundle, None));
    }
}

#[test]
fn odd_count_root_duplicates_the_tail() {
    let (_dir, mut store) = open_store();
    let mut leaves = Vec::new();
    for i in 0..3 {
        let c = store
            .commit(CommitmentType::State, payload(&format!("s{i}")))
            .unwrap();
        let bytes: [u8; 32] = hex::decode(&c.leaf_hash).unwrap().try_into().unwrap();
        leaves.push(bytes);
    }

    let expected = node_hash(
        &node_hash(&leaves[0], &leaves[1]),
        &node_hash(&leaves[2], &leaves[2]),
    );
    assert_eq!(store.root_hash().unwrap(), hex::encode(expected));
}

#[test]
fn bilateral_agreement_end_to_end() {
    let (_dir, mut store) = open_store();
    let commitment = store
        .commit(
            CommitmentType::Agreement,
            CommitmentPayload {
                subject: "code-review".into(),
                content: "Review PR #42 for 100 sats".into(),
                counterparty: Some("peerX".into()),
                metadata: None,
            },
        )
        .unwrap();
    let root_after_commit = store.root_hash().unwrap();

    store.record_anchor(&txid(0xC1), None).unwrap();
    let bundle = store.prove(&commitment.id).unwrap().unwrap();

    assert_eq!(bundle.anchor.txid, txid(0xC1));
    assert_eq!(bundle.merkle_proof.root_hash, root_after_commit);
    // Single leaf: the leaf is the root and the sibling list is empty.
    assert!(bundle.merkle_proof.siblings.is_empty());
    assert!(CommitmentStore::verify_bundle(
        &bundle,
        Some(&store.public_key())
    ));
    // A stranger's key must not verify the signature.
    let other = pact_crypto::IdentityKey::generate();
    assert!(!CommitmentStore::verify_bundle(
        &bundle,
        Some(&other.public_key_hex())
    ));
}

#[test]
fn proof_bundles_survive_serialization() {
    let (_dir, mut store) = open_store();
    let id = store
        .commit(CommitmentType::Attestation, payload("portable"))
        .unwrap()
        .id;
    store.record_anchor(&txid(0xD0), None).unwrap();

    let bundle = store.prove(&id).unwrap().unwrap();
    let encoded = serde_json::to_string_pretty(&bundle).unwrap();
    let decoded: pact_types::ProofBundle = serde_json::from_str(&encoded).unwrap();
    assert!(CommitmentStore::verify_bundle(
        &decoded,
        Some(&store.public_key())
    ));
}

#[test]
fn anchor_via_wallet_snapshots_assembly_state() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();

    let wallet = MockWallet { txid: txid(0xE0) };
    let outcome = store
        .anchor(AnchorOptions::default(), &wallet)
        .unwrap();
    match outcome {
        AnchorOutcome::Recorded(anchor) => {
            assert_eq!(anchor.txid, txid(0xE0));
            assert_eq!(anchor.commitment_count, 1);
            assert_eq!(anchor.root_hash, store.root_hash().unwrap());
        }
        other => panic!("expected recorded anchor, got {other:?}"),
    }
}

#[test]
fn dry_run_leaves_the_store_unchanged() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();

    let outcome = store
        .anchor(
            AnchorOptions {
                dry_run: true,
                ..Default::default()
            },
            &NoWallet,
        )
        .unwrap();
    assert!(matches!(outcome, AnchorOutcome::DryRun(_)));
    assert_eq!(store.latest_anchor().unwrap(), None);
}

#[test]
fn failed_broadcast_leaves_the_store_unchanged() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();

    let result = store.anchor(AnchorOptions::default(), &NoWallet);
    assert!(matches!(result, Err(StoreError::External(_))));
    assert_eq!(store.latest_anchor().unwrap(), None);
    assert_eq!(store.unanchored_count().unwrap(), 1);
}

#[test]
fn refresh_sets_height_once_and_never_unsets() {
    let (_dir, mut store) = open_store();
    store.commit(CommitmentType::State, payload("a")).unwrap();
    store.record_anchor(&txid(0xF0), None).unwrap();

    // Unknown txid: no anchor, no error.
    assert_eq!(
        store
            .refresh_anchor(&txid(0xFF), &StaticChain(ConfirmationStatus::pending()))
            .unwrap(),
        None
    );

    // Pending: unchanged.
    let anchor = store
        .refresh_anchor(&txid(0xF0), &StaticChain(ConfirmationStatus::pending()))
        .unwrap()
        .unwrap();
    assert_eq!(anchor.block_height, None);

    // Confirmed: height lands and persists.
    let anchor = store
        .refresh_anchor(
            &txid(0xF0),
            &StaticChain(ConfirmationStatus::confirmed_at(812_000)),
        )
        .unwrap()
        .unwrap();
    assert_eq!(anchor.block_height, Some(812_000));

    // A later pending observation must not revert the height; the chain
    // view is not even consulted once the anchor is terminal.
    let anchor = store
        .refresh_anchor(&txid(0xF0), &StaticChain(ConfirmationStatus::pending()))
        .unwrap()
        .unwrap();
    assert_eq!(anchor.block_height, Some(812_000));

    // The height also shows up in freshly generated proofs.
    let id = store.get_by_index(0).unwrap().unwrap().id;
    let bundle = store.prove(&id).unwrap().unwrap();
    assert_eq!(bundle.anchor.block_height, Some(812_000));
}

#[test]
fn anchors_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = CommitmentStore::open(dir.path()).unwrap();
        store.commit(CommitmentType::State, payload("a")).unwrap();
        store.record_anchor(&txid(0x21), None).unwrap();
        store.commit(CommitmentType::State, payload("b")).unwrap();
        store.close();
    }

    let store = CommitmentStore::open(dir.path()).unwrap();
    let anchor = store.latest_anchor().unwrap().unwrap();
    assert_eq!(anchor.txid, txid(0x21));
    assert_eq!(store.unanchored_count().unwrap(), 1);

    // The historical proof still verifies against the old anchor root
    // even though the live tree has moved past it.
    let id = store.get_by_index(0).unwrap().unwrap().id;
    let bundle = store.prove(&id).unwrap().unwrap();
    assert_eq!(bundle.merkle_proof.root_hash, anchor.root_hash);
    assert!(CommitmentStore::verify_bundle(&bundle, None));
}
