//! Client-side error taxonomy.
//!
//! Every failure recovers at the component that initiated the asynchronous
//! operation; nothing propagates to a global handler and nothing panics.
//! Transient RPC failures surface as retryable navigation errors, catalog
//! resolution failures as an explicit not-ready state.

use thiserror::Error;

/// Failure reported by a backend RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend rpc failed: {message}")]
pub struct RpcError {
    /// Human-readable failure description from the transport.
    pub message: String,
}

impl RpcError {
    /// Wrap a transport failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What can go wrong in the client layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A backend call failed; the operation may be retried by the user.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// No active catalog cell could be resolved. Callers must surface a
    /// retryable loading state, never fall back silently.
    #[error("catalog cell not ready")]
    CatalogNotReady,

    /// Every group in a fetched batch failed to decode. Partial decode
    /// failures are not errors; affected groups simply contribute no items.
    #[error("all {skipped} product groups in the batch failed to decode")]
    Decode {
        /// Number of groups that were skipped.
        skipped: usize,
    },
}
