// Path: crates/service/src/lib.rs
#![forbid(unsafe_code)]
//! # pact-service
//!
//! The proof protocol that sits on top of the store: five tagged message
//! kinds carried over an opaque, caller-supplied transport. This crate
//! owns the message grammar, request validation, rate limiting, and the
//! handler that turns inbound messages into responses. It never touches
//! a socket.

pub mod handler;
pub mod messages;
pub mod rate_limit;

pub use handler::{ProofService, ProofServiceConfig};
pub use messages::{ErrorCode, ProofMessage, RequestOptions};
pub use rate_limit::RateLimiter;
