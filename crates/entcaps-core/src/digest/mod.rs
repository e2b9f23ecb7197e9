//! Digest engine: Base64 digests of a verification string for a set of
//! allow-listed algorithms.
//!
//! The provider table is fixed when the engine is built. Share one engine
//! (behind an `Arc`) between every connection instead of mutating a global
//! registry.

pub mod algorithms;
pub mod providers;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::canonical::{canonicalize, VerificationString};
use crate::error::{CapsError, Result};
use crate::profile::DiscoveryProfile;
use crate::record::CapabilityRecord;

pub use providers::{DigestProvider, HashProvider};

/// Hashes verification strings with the registered providers.
#[derive(Clone)]
pub struct DigestEngine {
    providers: HashMap<String, Arc<dyn HashProvider>>,
}

impl DigestEngine {
    /// Engine with the built-in SHA-1 / SHA-2 providers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DigestEngineBuilder {
        DigestEngineBuilder::with_builtin()
    }

    /// Whether a provider is registered for `algo`.
    pub fn is_available(&self, algo: &str) -> bool {
        self.providers.contains_key(&algorithms::normalize(algo))
    }

    /// Allow-listed and backed by a provider.
    pub fn supports(&self, algo: &str) -> bool {
        algorithms::is_allowed(algo) && self.is_available(algo)
    }

    /// Sorted names of every algorithm this engine can compute.
    pub fn available_algorithms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Digest `bytes` once per requested algorithm.
    ///
    /// Every algorithm is validated before anything is hashed: an empty list,
    /// a name outside the allow-list, or an allowed name without a provider
    /// fails the whole call. The result never holds a subset of the request.
    pub fn digest<S: AsRef<str>>(&self, bytes: &[u8], algos: &[S]) -> Result<CapabilityRecord> {
        if algos.is_empty() {
            return Err(CapsError::NoAlgorithmsRequested);
        }

        let mut selected: Vec<(String, &Arc<dyn HashProvider>)> = Vec::with_capacity(algos.len());
        for algo in algos {
            let name = algorithms::normalize(algo.as_ref());
            if !algorithms::is_allowed(&name) {
                return Err(CapsError::UnsupportedAlgorithm(name));
            }
            let provider = self
                .providers
                .get(&name)
                .ok_or_else(|| CapsError::ProviderRequired(name.clone()))?;
            selected.push((name, provider));
        }

        CapabilityRecord::new(
            selected
                .into_iter()
                .map(|(name, provider)| (name, STANDARD.encode(provider.digest(bytes)))),
        )
    }

    /// Canonicalize `profile` and digest it.
    pub fn hash_profile<S: AsRef<str>>(
        &self,
        profile: &DiscoveryProfile,
        algos: &[S],
    ) -> Result<CapabilityRecord> {
        let vs: VerificationString = canonicalize(profile)?;
        self.digest(vs.as_bytes(), algos)
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DigestEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestEngine")
            .field("algorithms", &self.available_algorithms())
            .finish()
    }
}

/// Collects providers before the engine is frozen.
pub struct DigestEngineBuilder {
    providers: HashMap<String, Arc<dyn HashProvider>>,
}

impl DigestEngineBuilder {
    /// Builder without any provider, not even the built-ins.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut builder = Self::empty();
        for provider in providers::builtin() {
            builder.insert(Arc::from(provider));
        }
        builder
    }

    /// Register `provider`, replacing any previous provider of that name.
    ///
    /// Fails with [`CapsError::UnsupportedAlgorithm`] if the provider's name is
    /// not allow-listed.
    pub fn register(mut self, provider: Arc<dyn HashProvider>) -> Result<Self> {
        let name = algorithms::normalize(provider.algorithm());
        if !algorithms::is_allowed(&name) {
            return Err(CapsError::UnsupportedAlgorithm(name));
        }
        self.insert(provider);
        Ok(self)
    }

    /// Register a batch of providers, e.g. [`providers::sha3_providers`].
    pub fn register_all(
        mut self,
        providers: impl IntoIterator<Item = Box<dyn HashProvider>>,
    ) -> Result<Self> {
        for provider in providers {
            self = self.register(Arc::from(provider))?;
        }
        Ok(self)
    }

    pub fn build(self) -> DigestEngine {
        DigestEngine {
            providers: self.providers,
        }
    }

    fn insert(&mut self, provider: Arc<dyn HashProvider>) {
        let name = algorithms::normalize(provider.algorithm());
        self.providers.insert(name, provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::vectors::{complex_profile, simple_profile};

    #[derive(Debug)]
    struct Sha3Provider;

    impl HashProvider for Sha3Provider {
        fn algorithm(&self) -> &str {
            "SHA3-256"
        }

        fn digest(&self, data: &[u8]) -> Vec<u8> {
            use sha3::Digest;
            sha3::Sha3_256::digest(data).to_vec()
        }
    }

    struct Md4;

    impl HashProvider for Md4 {
        fn algorithm(&self) -> &str {
            "md4"
        }

        fn digest(&self, _data: &[u8]) -> Vec<u8> {
            Vec::new()
        }
    }

    fn engine_with_sha3() -> DigestEngine {
        DigestEngine::builder()
            .register(Arc::new(Sha3Provider))
            .unwrap()
            .build()
    }

    #[test]
    fn test_simple_vector_sha256() {
        let record = DigestEngine::new()
            .hash_profile(&simple_profile(), &["sha-256"])
            .unwrap();
        assert_eq!(
            record.digest("sha-256"),
            Some("kzBZbkqJ3ADrj7v08reD1qcWUwNGHaidNUgD7nHpiw8=")
        );
    }

    #[test]
    fn test_complex_vector_sha256() {
        let record = DigestEngine::new()
            .hash_profile(&complex_profile(), &["sha-256"])
            .unwrap();
        assert_eq!(
            record.digest("sha-256"),
            Some("u79ZroNJbdSWhdSp311mddz44oHHPsEBntQ5b1jqBSY=")
        );
    }

    #[test]
    fn test_vectors_with_registered_sha3() {
        let engine = engine_with_sha3();
        let simple = engine
            .hash_profile(&simple_profile(), &["sha-256", "SHA3-256"])
            .unwrap();
        assert_eq!(
            simple.digest("sha3-256"),
            Some("79mdYAfU9rEdTOcWDO7UEAt6E56SUzk/g6TnqUeuD9Q=")
        );
        let complex = engine.hash_profile(&complex_profile(), &["sha3-256"]).unwrap();
        assert_eq!(
            complex.digest("sha3-256"),
            Some("XpUJzLAc93258sMECZ3FJpebkzuyNXDzRNwQog8eycg=")
        );
    }

    #[test]
    fn test_other_builtin_algorithms() {
        let record = DigestEngine::new()
            .hash_profile(&simple_profile(), &["sha-1", "sha-512"])
            .unwrap();
        assert_eq!(record.digest("sha-1"), Some("zkwogI8zTfQzkDxVOTYYX6IA80g="));
        assert_eq!(
            record.digest("sha-512"),
            Some("Jgf678SaWHEy58b+BvQ0mLKirEmyB36OvtHZXxMN9b0ooGX6iBI+cw97ekAdV9VBzL3g/Z3azzavKWe9oic9Fw==")
        );
    }

    #[test]
    fn test_empty_algorithm_list() {
        let err = DigestEngine::new().digest(b"x", &[] as &[&str]).unwrap_err();
        assert_eq!(err, CapsError::NoAlgorithmsRequested);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = DigestEngine::new()
            .digest(b"x", &["sha-256", "md4"])
            .unwrap_err();
        assert_eq!(err, CapsError::UnsupportedAlgorithm("md4".to_string()));
    }

    #[test]
    fn test_provider_required() {
        let err = DigestEngine::new().digest(b"x", &["sha3-256"]).unwrap_err();
        assert_eq!(err, CapsError::ProviderRequired("sha3-256".to_string()));
        let err = DigestEngine::new().digest(b"x", &["md5"]).unwrap_err();
        assert_eq!(err, CapsError::ProviderRequired("md5".to_string()));
    }

    #[test]
    fn test_register_rejects_disallowed_name() {
        let err = DigestEngine::builder()
            .register(Arc::new(Md4))
            .err()
            .unwrap();
        assert_eq!(err, CapsError::UnsupportedAlgorithm("md4".to_string()));
    }

    #[test]
    fn test_empty_builder_has_nothing() {
        let engine = DigestEngineBuilder::empty().build();
        assert!(engine.available_algorithms().is_empty());
        assert!(!engine.supports("sha-256"));
    }

    #[test]
    fn test_digest_deterministic() {
        let engine = DigestEngine::new();
        let a = engine.hash_profile(&complex_profile(), &["sha-256", "sha-384"]).unwrap();
        let b = engine.hash_profile(&complex_profile(), &["sha-384", "sha-256"]).unwrap();
        assert!(a.exact_eq(&b));
    }

    #[cfg(feature = "blake2")]
    #[test]
    fn test_blake2_providers() {
        let engine = DigestEngine::builder()
            .register_all(providers::blake2_providers())
            .unwrap()
            .build();
        let record = engine.hash_profile(&simple_profile(), &["blake2b-256"]).unwrap();
        assert_eq!(
            record.digest("blake2b-256"),
            Some("2KmRi7KnEZXxIhhASXGRFad6XmCSjHaCYZiopMSYIoI=")
        );
    }
}
