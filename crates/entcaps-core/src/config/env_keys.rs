//! 环境变量 key 常量与别名定义
//!
//! 主变量统一使用 `ENTCAPS_*` 前缀。

/// 哈希算法与协议参数
pub mod caps {
    /// Comma-separated local algorithm set; the first entry is the default.
    pub const ENTCAPS_ALGORITHMS: &str = "ENTCAPS_ALGORITHMS";
    pub const ALGORITHMS_ALIASES: &[&str] = &["ENTCAPS_HASHES"];

    pub const ENTCAPS_RETAINED_HASHES: &str = "ENTCAPS_RETAINED_HASHES";

    /// Seconds to wait for a single disco#info answer.
    pub const ENTCAPS_QUERY_TIMEOUT_SECS: &str = "ENTCAPS_QUERY_TIMEOUT_SECS";
}

/// 缓存容量与持久化目录
pub mod cache {
    pub const ENTCAPS_CACHE_DIR: &str = "ENTCAPS_CACHE_DIR";
    pub const CACHE_DIR_ALIASES: &[&str] = &["ENTCAPS_STORE_DIR"];

    pub const ENTCAPS_PROFILE_CACHE_CAPACITY: &str = "ENTCAPS_PROFILE_CACHE_CAPACITY";
    pub const ENTCAPS_PEER_CACHE_CAPACITY: &str = "ENTCAPS_PEER_CACHE_CAPACITY";
}

/// 可观测性与日志
pub mod observability {
    pub const ENTCAPS_QUIET: &str = "ENTCAPS_QUIET";
    pub const ENTCAPS_LOG_LEVEL: &str = "ENTCAPS_LOG_LEVEL";
    pub const ENTCAPS_LOG_JSON: &str = "ENTCAPS_LOG_JSON";
}
