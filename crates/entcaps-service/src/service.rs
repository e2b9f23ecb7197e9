//! Process-wide capability state shared by every connection.

use std::sync::Arc;

use entcaps_cache::{CapsCache, StoreError};
use entcaps_core::{CapsConfig, DigestEngine};

/// Digest engine, two-tier cache and configuration, shared behind an `Arc`
/// by all connections of a process.
#[derive(Debug)]
pub struct CapsService {
    pub(crate) engine: Arc<DigestEngine>,
    pub(crate) cache: Arc<CapsCache>,
    pub(crate) config: CapsConfig,
}

impl CapsService {
    pub fn new(engine: Arc<DigestEngine>, cache: Arc<CapsCache>, config: CapsConfig) -> Self {
        Self {
            engine,
            cache,
            config,
        }
    }

    /// Build the cache from `config`, attaching the persistent tier when
    /// `cache_dir` is set.
    pub fn from_config(engine: Arc<DigestEngine>, config: CapsConfig) -> Result<Self, StoreError> {
        let cache = Arc::new(CapsCache::open(Arc::clone(&engine), &config)?);
        Ok(Self::new(engine, cache, config))
    }

    pub fn engine(&self) -> &Arc<DigestEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<CapsCache> {
        &self.cache
    }

    pub fn config(&self) -> &CapsConfig {
        &self.config
    }
}
