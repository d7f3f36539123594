// Path: crates/service/src/handler/tests.rs

use super::*;
use pact_store::wallet::{ChainView, ConfirmationStatus};
use pact_types::error::ExternalError;
use pact_types::{CommitmentPayload, CommitmentType};

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

fn commit(store: &mut CommitmentStore, subject: &str) -> String {
    store
        .commit(
            CommitmentType::Attestation,
            CommitmentPayload::new(subject, "content"),
        )
        .unwrap()
        .id
}

fn txid(byte: u8) -> String {
    format!("{byte:02x}").repeat(32)
}

fn request_by_id(id: &str, options: Option<RequestOptions>) -> ProofMessage {
    ProofMessage::Request {
        request_id: "req-1".into(),
        commitment_id: Some(id.into()),
        query: None,
        options,
    }
}

fn request_by_query(filter: CommitmentFilter, options: Option<RequestOptions>) -> ProofMessage {
    ProofMessage::Request {
        request_id: "req-1".into(),
        commitment_id: None,
        query: Some(filter),
        options,
    }
}

fn expect_error(reply: Option<ProofMessage>) -> ErrorCode {
    match reply {
        Some(ProofMessage::Error { code, .. }) => code,
        other => panic!("expected error, got {other:?}"),
    }
}

fn expect_response(reply: Option<ProofMessage>) -> (Vec<pact_types::ProofBundle>, u64, Option<String>) {
    match reply {
        Some(ProofMessage::Response {
            proofs,
            total,
            public_key,
            ..
        }) => (proofs, total, public_key),
        other => panic!("expected response, got {other:?}"),
    }
}

#[test]
fn unknown_commitment_is_not_found() {
    let (_dir, store) = open_store();
    let mut service = ProofService::new(ProofServiceConfig::default());

    let reply = service.handle(&store, "peer", request_by_id("commit_missing", None));
    assert_eq!(expect_error(reply), ErrorCode::NotFound);
}

#[test]
fn unanchored_commitment_is_not_anchored() {
    let (_dir, mut store) = open_store();
    let id = commit(&mut store, "s");
    let mut service = ProofService::new(ProofServiceConfig::default());

    let reply = service.handle(&store, "peer", request_by_id(&id, None));
    assert_eq!(expect_error(reply), ErrorCode::NotAnchored);
}

#[test]
fn anchored_commitment_yields_a_verifying_proof() {
    let (_dir, mut store) = open_store();
    let id = commit(&mut store, "s");
    store.record_anchor(&txid(0x11), None).unwrap();

    let mut service = ProofService::new(ProofServiceConfig::default());
    let options = RequestOptions {
        include_public_key: true,
        ..Default::default()
    };
    let reply = service.handle(&store, "peer", request_by_id(&id, Some(options)));
    let (proofs, total, public_key) = expect_response(reply);

    assert_eq!(total, 1);
    assert_eq!(proofs.len(), 1);
    assert_eq!(public_key.as_deref(), Some(store.public_key().as_str()));
    assert!(CommitmentStore::verify_bundle(
        &proofs[0],
        public_key.as_deref()
    ));
}

#[test]
fn request_must_name_exactly_one_selector() {
    let (_dir, store) = open_store();
    let mut service = ProofService::new(ProofServiceConfig::default());

    let neither = ProofMessage::Request {
        request_id: "r".into(),
        commitment_id: None,
        query: None,
        options: None,
    };
    assert_eq!(
        expect_error(service.handle(&store, "peer", neither)),
        ErrorCode::InvalidRequest
    );

    let both = ProofMessage::Request {
        request_id: "r".into(),
        commitment_id: Some("commit_x".into()),
        query: Some(CommitmentFilter::default()),
        options: None,
    };
    assert_eq!(
        expect_error(service.handle(&store, "peer", both)),
        ErrorCode::InvalidRequest
    );
}

#[test]
fn over_limit_query_is_rejected_before_the_store() {
    let (_dir, store) = open_store();
    let mut service = ProofService::new(ProofServiceConfig::default());

    let filter = CommitmentFilter {
        limit: Some(101),
        ..Default::default()
    };
    let reply = service.handle(&store, "peer", request_by_query(filter, None));
    assert_eq!(expect_error(reply), ErrorCode::InvalidRequest);
}

#[test]
fn query_counts_unanchored_matches_unless_suppressed() {
    let (_dir, mut store) = open_store();
    commit(&mut store, "alpha");
    commit(&mut store, "beta");
    store.record_anchor(&txid(0x22), None).unwrap();
    commit(&mut store, "gamma");

    let mut service = ProofService::new(ProofServiceConfig::default());

    let (proofs, total, _) = expect_response(service.handle(
        &store,
        "peer",
        request_by_query(CommitmentFilter::default(), None),
    ));
    assert_eq!(proofs.len(), 2);
    assert_eq!(total, 3);

    let options = RequestOptions {
        require_anchored: true,
        ..Default::default()
    };
    let (proofs, total, _) = expect_response(service.handle(
        &store,
        "peer",
        request_by_query(CommitmentFilter::default(), Some(options)),
    ));
    assert_eq!(proofs.len(), 2);
    assert_eq!(total, 2);
}

#[test]
fn min_confirmations_gates_on_anchor_depth() {
    let (_dir, mut store) = open_store();
    let id = commit(&mut store, "s");
    store.record_anchor(&txid(0x33), None).unwrap();

    let mut service = ProofService::new(ProofServiceConfig::default());
    let options = RequestOptions {
        min_confirmations: Some(6),
        ..Default::default()
    };

    // Unconfirmed anchor: treated as missing.
    let reply = service.handle(&store, "peer", request_by_id(&id, Some(options.clone())));
    assert_eq!(expect_error(reply), ErrorCode::NotAnchored);

    // Confirmed at height 100, tip at 105: exactly 6 confirmations.
    store
        .refresh_anchor(&txid(0x33), &StaticChain(ConfirmationStatus::confirmed_at(100)))
        .unwrap();
    service.set_chain_tip(105);
    let (proofs, total, _) =
        expect_response(service.handle(&store, "peer", request_by_id(&id, Some(options.clone()))));
    assert_eq!((proofs.len(), total), (1, 1));

    // Tip at 104: only 5 deep.
    service.set_chain_tip(104);
    let reply = service.handle(&store, "peer", request_by_id(&id, Some(options)));
    assert_eq!(expect_error(reply), ErrorCode::NotAnchored);
}

#[test]
fn rate_limit_short_circuits_before_the_store() {
    let (_dir, mut store) = open_store();
    let id = commit(&mut store, "s");
    store.record_anchor(&txid(0x44), None).unwrap();

    let mut service = ProofService::new(ProofServiceConfig {
        requests_per_minute: 2,
    });

    for _ in 0..2 {
        let reply = service.handle(&store, "peerA", request_by_id(&id, None));
        assert!(matches!(reply, Some(ProofMessage::Response { .. })));
    }
    let reply = service.handle(&store, "peerA", request_by_id(&id, None));
    assert_eq!(expect_error(reply), ErrorCode::RateLimited);

    // Another peer is unaffected.
    let reply = service.handle(&store, "peerB", request_by_id(&id, None));
    assert!(matches!(reply, Some(ProofMessage::Response { .. })));
}

#[test]
fn push_acks_with_verification_result() {
    let (_dir, mut store) = open_store();
    let id = commit(&mut store, "s");
    store.record_anchor(&txid(0x55), None).unwrap();
    let bundle = store.prove(&id).unwrap().unwrap();
    let key = store.public_key();

    let mut service = ProofService::new(ProofServiceConfig::default());

    let push = ProofMessage::Push {
        push_id: "push-1".into(),
        proof: bundle.clone(),
        public_key: key.clone(),
        reason: None,
    };
    match service.handle(&store, "peer", push) {
        Some(ProofMessage::Ack {
            accepted, verified, ..
        }) => {
            assert!(accepted);
            assert_eq!(verified, Some(true));
        }
        other => panic!("expected ack, got {other:?}"),
    }

    // Same proof pushed under the wrong key fails verification.
    let mut tampered = bundle;
    tampered.merkle_proof.root_hash = "00".repeat(32);
    let push = ProofMessage::Push {
        push_id: "push-2".into(),
        proof: tampered,
        public_key: key,
        reason: None,
    };
    match service.handle(&store, "peer", push) {
        Some(ProofMessage::Ack {
            verified, error, ..
        }) => {
            assert_eq!(verified, Some(false));
            assert!(error.is_some());
        }
        other => panic!("expected ack, got {other:?}"),
    }
}

#[test]
fn inbound_replies_are_absorbed() {
    let (_dir, store) = open_store();
    let mut service = ProofService::new(ProofServiceConfig::default());

    let ack = ProofMessage::Ack {
        push_id: "p".into(),
        accepted: true,
        verified: None,
        error: None,
    };
    assert!(service.handle(&store, "peer", ack).is_none());
}
