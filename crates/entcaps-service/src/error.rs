use thiserror::Error;

/// Transport failures reported by a [`crate::DiscoveryClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The peer did not answer.
    #[error("No response from {peer}")]
    NoResponse { peer: String },

    #[error("Not connected")]
    NotConnected,

    /// The peer answered with an error stanza, e.g. `item-not-found`.
    #[error("Remote error from {peer}: {condition}")]
    Remote { peer: String, condition: String },

    /// The query was cancelled, typically because the connection went away.
    #[error("Discovery query interrupted")]
    Interrupted,
}

/// Errors surfaced by [`crate::CapsService::resolve`]. Verification
/// failures are not errors; they resolve to `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Discovery transport failed: {0}")]
    Transport(#[from] DiscoveryError),
}
