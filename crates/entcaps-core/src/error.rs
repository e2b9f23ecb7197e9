//! Error taxonomy shared by the canonicalizer, digest engine and document codec.

use thiserror::Error;

/// Errors returned while hashing or decoding a discovery profile.
///
/// A verification mismatch is deliberately absent: comparing digests yields a
/// [`crate::record::Verification`] value, never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapsError {
    /// The profile violates a precondition of the verification string.
    #[error("Malformed discovery profile: {0}")]
    MalformedProfile(String),

    /// The algorithm is not on the XEP-0300 allow-list.
    #[error("Hash algorithm '{0}' is not allowed for entity capabilities")]
    UnsupportedAlgorithm(String),

    /// The algorithm is allowed but no provider is registered for it.
    #[error("Hash algorithm '{0}' needs a registered provider")]
    ProviderRequired(String),

    #[error("At least one hash algorithm must be requested")]
    NoAlgorithmsRequested,

    /// A profile document could not be parsed or written.
    #[error("Invalid profile document: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, CapsError>;
