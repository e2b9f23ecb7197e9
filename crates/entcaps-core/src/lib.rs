//! Entity capabilities (XEP-0390) core.
//!
//! Pure, synchronous building blocks: the discovery profile model, the
//! verification string, the digest engine and its providers, capability
//! records, the XML wire codecs and the environment-driven configuration.
//! Caching lives in `entcaps-cache`; the network-facing protocol in
//! `entcaps-service`.

pub mod canonical;
pub mod config;
pub mod digest;
pub mod error;
pub mod profile;
pub mod record;
pub mod wire;

pub use canonical::{canonicalize, VerificationString};
pub use config::{CapsConfig, ObservabilityConfig};
pub use digest::{DigestEngine, DigestEngineBuilder, DigestProvider, HashProvider};
pub use error::{CapsError, Result};
pub use profile::{DataForm, DiscoveryProfile, FormField, Identity};
pub use record::{
    node_id, parse_node_id, CapabilityRecord, RecordComparison, Verification, CAPS_NAMESPACE,
};
pub use wire::{read_profile, write_profile, CapsElement, HashElement};
