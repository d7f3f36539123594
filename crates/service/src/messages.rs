// Path: crates/service/src/messages.rs
//! Wire grammar of the proof protocol.
//!
//! Messages are JSON objects dispatched on a `type` tag. Decode failures
//! are the transport's problem; everything that parses lands in
//! [`ProofMessage`] and is validated by the handler.

use pact_types::{CommitmentFilter, ProofBundle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    NotAnchored,
    InvalidRequest,
    Unauthorized,
    RateLimited,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::NotAnchored => "NOT_ANCHORED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(s)
    }
}

/// Options a requester may attach to a proof request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// Drop matches that no anchor covers instead of counting them.
    pub require_anchored: bool,
    /// Treat anchors below this confirmation depth as missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confirmations: Option<u64>,
    /// Attach the responder's public key to the response.
    pub include_public_key: bool,
}

/// The five protocol message kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProofMessage {
    /// Ask for proofs by commitment id or by query.
    #[serde(rename = "PROOF_REQUEST", rename_all = "camelCase")]
    Request {
        request_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commitment_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<CommitmentFilter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<RequestOptions>,
    },
    /// Successful answer to a request.
    #[serde(rename = "PROOF_RESPONSE", rename_all = "camelCase")]
    Response {
        request_id: String,
        proofs: Vec<ProofBundle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_key: Option<String>,
        /// Number of matching commitments, including any the responder
        /// could not produce proofs for.
        total: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Unsolicited proof delivery.
    #[serde(rename = "PROOF_PUSH", rename_all = "camelCase")]
    Push {
        push_id: String,
        proof: ProofBundle,
        public_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Receipt for a push.
    #[serde(rename = "PROOF_ACK", rename_all = "camelCase")]
    Ack {
        push_id: String,
        accepted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        verified: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Failure answer to a request or push.
    #[serde(rename = "PROOF_ERROR", rename_all = "camelCase")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        push_id: Option<String>,
        code: ErrorCode,
        message: String,
    },
}

impl ProofMessage {
    /// Build an error reply to a request.
    pub fn request_error(request_id: &str, code: ErrorCode, message: impl Into<String>) -> Self {
        ProofMessage::Error {
            request_id: Some(request_id.to_string()),
            push_id: None,
            code,
            message: message.into(),
        }
    }
}
