//! 按领域分组的配置结构体
//!
//! 从环境变量加载，统一 fallback 逻辑。

use std::path::PathBuf;
use std::time::Duration;

use super::env_keys::{cache as cache_keys, caps as caps_keys, observability as obv_keys};
use super::loader::{env_bool, env_list, env_optional, env_or, env_parse};
use crate::digest::algorithms::{self, DEFAULT_ALGORITHM};
use crate::error::{CapsError, Result};

pub const DEFAULT_PROFILE_CACHE_CAPACITY: usize = 1000;
pub const DEFAULT_PEER_CACHE_CAPACITY: usize = 10_000;
pub const DEFAULT_RETAINED_HASHES: usize = 10;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// Substituted for a zero timeout, which would fail every query at once.
pub const MIN_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// 能力哈希子系统配置
#[derive(Debug, Clone)]
pub struct CapsConfig {
    /// Local algorithm set, normalized. Never empty; the first entry is the
    /// default algorithm.
    pub algorithms: Vec<String>,
    pub profile_cache_capacity: usize,
    pub peer_cache_capacity: usize,
    /// How many previously published records keep their responders.
    pub retained_hashes: usize,
    pub query_timeout: Duration,
    /// Persistent store directory; `None` keeps the cache memory-only.
    pub cache_dir: Option<PathBuf>,
}

impl Default for CapsConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![DEFAULT_ALGORITHM.to_string()],
            profile_cache_capacity: DEFAULT_PROFILE_CACHE_CAPACITY,
            peer_cache_capacity: DEFAULT_PEER_CACHE_CAPACITY,
            retained_hashes: DEFAULT_RETAINED_HASHES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            cache_dir: None,
        }
    }
}

impl CapsConfig {
    /// 从环境变量加载，未设置或无法解析的项使用默认值
    pub fn from_env() -> Self {
        let algorithms = env_list(caps_keys::ENTCAPS_ALGORITHMS, caps_keys::ALGORITHMS_ALIASES)
            .map(|list| list.iter().map(|a| algorithms::normalize(a)).collect())
            .unwrap_or_else(|| vec![DEFAULT_ALGORITHM.to_string()]);
        let timeout_secs = env_parse(
            caps_keys::ENTCAPS_QUERY_TIMEOUT_SECS,
            &[],
            DEFAULT_QUERY_TIMEOUT.as_secs(),
        );

        Self {
            algorithms,
            profile_cache_capacity: env_parse(
                cache_keys::ENTCAPS_PROFILE_CACHE_CAPACITY,
                &[],
                DEFAULT_PROFILE_CACHE_CAPACITY,
            )
            .max(1),
            peer_cache_capacity: env_parse(
                cache_keys::ENTCAPS_PEER_CACHE_CAPACITY,
                &[],
                DEFAULT_PEER_CACHE_CAPACITY,
            )
            .max(1),
            retained_hashes: env_parse(
                caps_keys::ENTCAPS_RETAINED_HASHES,
                &[],
                DEFAULT_RETAINED_HASHES,
            ),
            query_timeout: clamp_query_timeout(Duration::from_secs(timeout_secs)),
            cache_dir: env_optional(cache_keys::ENTCAPS_CACHE_DIR, cache_keys::CACHE_DIR_ALIASES)
                .map(PathBuf::from),
        }
    }

    /// Algorithm used when a single node identifier is needed.
    pub fn default_algorithm(&self) -> &str {
        self.algorithms
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ALGORITHM)
    }

    /// Reject an empty set or names outside the allow-list before any hashing.
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(CapsError::NoAlgorithmsRequested);
        }
        for algo in &self.algorithms {
            if !algorithms::is_allowed(algo) {
                return Err(CapsError::UnsupportedAlgorithm(algo.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn with_algorithms<I, S>(mut self, algos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.algorithms = algos
            .into_iter()
            .map(|a| algorithms::normalize(a.as_ref()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_profile_cache_capacity(mut self, capacity: usize) -> Self {
        self.profile_cache_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_peer_cache_capacity(mut self, capacity: usize) -> Self {
        self.peer_cache_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_retained_hashes(mut self, retained: usize) -> Self {
        self.retained_hashes = retained;
        self
    }

    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = clamp_query_timeout(timeout);
        self
    }
}

fn clamp_query_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        tracing::warn!(
            "query timeout of zero would fail every lookup, using {:?}",
            MIN_QUERY_TIMEOUT
        );
        MIN_QUERY_TIMEOUT
    } else {
        timeout
    }
}

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::ENTCAPS_QUIET, &[], false),
            log_level: env_or(obv_keys::ENTCAPS_LOG_LEVEL, &[], || {
                "entcaps=info".to_string()
            }),
            log_json: env_bool(obv_keys::ENTCAPS_LOG_JSON, &[], false),
        })
    }
}
