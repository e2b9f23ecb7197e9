//! XEP-0300 hash function names accepted for capability hashes.

/// Names from the IANA "Hash Function Textual Names" registry.
pub const IANA_ALGORITHMS: &[&str] = &[
    "md2", "md5", "sha-1", "sha-224", "sha-256", "sha-384", "sha-512", "shake128", "shake256",
];

/// Names XEP-0300 adds on top of the IANA registry.
pub const ADDITIONAL_ALGORITHMS: &[&str] = &["sha3-256", "sha3-512", "blake2b-256", "blake2b-512"];

/// Used when a caller does not configure its own algorithm set.
pub const DEFAULT_ALGORITHM: &str = "sha-256";

/// Lowercase an algorithm name the way it is stored in records.
pub fn normalize(algo: &str) -> String {
    algo.trim().to_ascii_lowercase()
}

/// Whether `algo` (any case) is on the allow-list.
pub fn is_allowed(algo: &str) -> bool {
    let algo = normalize(algo);
    IANA_ALGORITHMS.contains(&algo.as_str()) || ADDITIONAL_ALGORITHMS.contains(&algo.as_str())
}
