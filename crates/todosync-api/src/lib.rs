//! Async HTTP transport for the task-service sync protocol.
//!
//! This crate only moves bytes: it builds the form-encoded sync request,
//! posts it, and hands back the decoded JSON object. Everything that
//! interprets the payload (reconciliation, temp ids, cursors) lives in
//! `todosync-core`.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::{ApiResponse, SyncClient};
pub use error::Error;
pub use request::{SyncRequest, WILDCARD_SYNC_TOKEN};
pub use transport::{TlsMode, TransportConfig};
