// Path: crates/service/src/handler.rs
//! The proof service: turns inbound protocol messages into replies.
//!
//! The handler is transport-agnostic and synchronous. It rate-limits the
//! peer before touching the store, validates the request shape, and maps
//! store results onto the protocol's error codes. Responses and acks are
//! returned to the caller for delivery; inbound responses and acks are
//! absorbed.

use crate::messages::{ErrorCode, ProofMessage, RequestOptions};
use crate::rate_limit::RateLimiter;
use pact_store::CommitmentStore;
use pact_types::filter::MAX_QUERY_LIMIT;
use pact_types::{CommitmentFilter, ProofBundle};

/// Tunables for the proof service.
#[derive(Debug, Clone)]
pub struct ProofServiceConfig {
    /// Per-peer request cap per rolling minute.
    pub requests_per_minute: u32,
}

impl Default for ProofServiceConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: crate::rate_limit::DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

/// Stateful handler for one store's proof endpoint.
pub struct ProofService {
    limiter: RateLimiter,
    /// Latest chain height the glue layer has observed; used to turn
    /// anchor heights into confirmation depths.
    chain_tip: Option<u64>,
}

impl ProofService {
    pub fn new(config: ProofServiceConfig) -> Self {
        Self {
            limiter: RateLimiter::per_minute(config.requests_per_minute),
            chain_tip: None,
        }
    }

    /// Record the chain tip height for confirmation-depth checks.
    pub fn set_chain_tip(&mut self, height: u64) {
        self.chain_tip = Some(height);
    }

    /// Handle one inbound message from `peer`. Returns the reply to send,
    /// or `None` for message kinds that take no reply.
    pub fn handle(
        &mut self,
        store: &CommitmentStore,
        peer: &str,
        message: ProofMessage,
    ) -> Option<ProofMessage> {
        match message {
            ProofMessage::Request {
                request_id,
                commitment_id,
                query,
                options,
            } => {
                if !self.limiter.check(peer) {
                    log::warn!("Rate-limited proof request from {peer}");
                    return Some(ProofMessage::request_error(
                        &request_id,
                        ErrorCode::RateLimited,
                        "request rate limit exceeded",
                    ));
                }
                Some(self.handle_request(store, request_id, commitment_id, query, options))
            }
            ProofMessage::Push {
                push_id,
                proof,
                public_key,
                reason: _,
            } => {
                if !self.limiter.check(peer) {
                    log::warn!("Rate-limited proof push from {peer}");
                    return Some(ProofMessage::Error {
                        request_id: None,
                        push_id: Some(push_id),
                        code: ErrorCode::RateLimited,
                        message: "push rate limit exceeded".into(),
                    });
                }
                Some(Self::handle_push(push_id, &proof, &public_key))
            }
            // Terminal message kinds: nothing to send back.
            ProofMessage::Response { .. } | ProofMessage::Ack { .. } | ProofMessage::Error { .. } => {
                None
            }
        }
    }

    fn handle_request(
        &self,
        store: &CommitmentStore,
        request_id: String,
        commitment_id: Option<String>,
        query: Option<CommitmentFilter>,
        options: Option<RequestOptions>,
    ) -> ProofMessage {
        let options = options.unwrap_or_default();

        match (commitment_id, query) {
            (Some(id), None) => self.serve_by_id(store, request_id, &id, &options),
            (None, Some(filter)) => self.serve_by_query(store, request_id, &filter, &options),
            (Some(_), Some(_)) => ProofMessage::request_error(
                &request_id,
                ErrorCode::InvalidRequest,
                "specify either commitmentId or query, not both",
            ),
            (None, None) => ProofMessage::request_error(
                &request_id,
                ErrorCode::InvalidRequest,
                "request must specify commitmentId or query",
            ),
        }
    }

    fn serve_by_id(
        &self,
        store: &CommitmentStore,
        request_id: String,
        id: &str,
        options: &RequestOptions,
    ) -> ProofMessage {
        match store.get(id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return ProofMessage::request_error(
                    &request_id,
                    ErrorCode::NotFound,
                    format!("unknown commitment: {id}"),
                )
            }
            Err(e) => return internal_error(&request_id, e),
        }

        match store.prove(id) {
            Ok(Some(bundle)) if self.meets_confirmations(&bundle, options) => {
                ProofMessage::Response {
                    request_id,
                    proofs: vec![bundle],
                    public_key: options
                        .include_public_key
                        .then(|| store.public_key()),
                    total: 1,
                    error: None,
                }
            }
            Ok(Some(_)) | Ok(None) => ProofMessage::request_error(
                &request_id,
                ErrorCode::NotAnchored,
                format!("commitment {id} has no qualifying anchor"),
            ),
            Err(e) => internal_error(&request_id, e),
        }
    }

    fn serve_by_query(
        &self,
        store: &CommitmentStore,
        request_id: String,
        filter: &CommitmentFilter,
        options: &RequestOptions,
    ) -> ProofMessage {
        if filter.limit.map(|l| l > MAX_QUERY_LIMIT).unwrap_or(false) {
            return ProofMessage::request_error(
                &request_id,
                ErrorCode::InvalidRequest,
                format!("query limit exceeds maximum of {MAX_QUERY_LIMIT}"),
            );
        }

        let matches = match store.query(filter) {
            Ok(matches) => matches,
            Err(e) => return internal_error(&request_id, e),
        };

        let mut proofs = Vec::new();
        let mut total = 0u64;
        for commitment in &matches {
            match store.prove(&commitment.id) {
                Ok(Some(bundle)) if self.meets_confirmations(&bundle, options) => {
                    total += 1;
                    proofs.push(bundle);
                }
                Ok(Some(_)) | Ok(None) => {
                    if !options.require_anchored {
                        total += 1;
                    }
                }
                Err(e) => return internal_error(&request_id, e),
            }
        }

        ProofMessage::Response {
            request_id,
            proofs,
            public_key: options.include_public_key.then(|| store.public_key()),
            total,
            error: None,
        }
    }

    fn handle_push(push_id: String, proof: &ProofBundle, public_key: &str) -> ProofMessage {
        let verified = CommitmentStore::verify_bundle(proof, Some(public_key));
        ProofMessage::Ack {
            push_id,
            accepted: true,
            verified: Some(verified),
            error: (!verified).then(|| "proof failed verification".to_string()),
        }
    }

    /// Whether the bundle's anchor satisfies the requested confirmation
    /// depth. With no observed tip, a set height is accepted as confirmed
    /// at unknown depth.
    fn meets_confirmations(&self, bundle: &ProofBundle, options: &RequestOptions) -> bool {
        let Some(min) = options.min_confirmations else {
            return true;
        };
        if min == 0 {
            return true;
        }
        let Some(height) = bundle.anchor.block_height else {
            return false;
        };
        match self.chain_tip {
            Some(tip) => tip.saturating_sub(height) + 1 >= min,
            None => true,
        }
    }
}

fn internal_error(request_id: &str, e: pact_types::error::StoreError) -> ProofMessage {
    log::error!("Proof request {request_id} failed: {e}");
    ProofMessage::request_error(request_id, ErrorCode::InternalError, e.to_string())
}

#[cfg(test)]
mod tests;
