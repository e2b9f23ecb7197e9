//! Capability records: algorithm → Base64 digest for one discovery profile.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::digest::algorithms::normalize;
use crate::error::{CapsError, Result};

/// Namespace of the `<c/>` element and prefix of every capability node.
pub const CAPS_NAMESPACE: &str = "urn:xmpp:caps";

/// Build the node identifier `urn:xmpp:caps#<algo>.<digest>`.
pub fn node_id(algo: &str, digest: &str) -> String {
    format!("{}#{}.{}", CAPS_NAMESPACE, algo, digest)
}

/// Split a node identifier back into `(algo, digest)`.
///
/// Algorithm names never contain a dot and Base64 never produces one, so the
/// first dot after the `#` is the separator.
pub fn parse_node_id(node: &str) -> Option<(String, String)> {
    let rest = node.strip_prefix(CAPS_NAMESPACE)?.strip_prefix('#')?;
    let (algo, digest) = rest.split_once('.')?;
    if algo.is_empty() || digest.is_empty() {
        return None;
    }
    Some((normalize(algo), digest.to_string()))
}

/// How two records are compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordComparison {
    /// Both records carry `algo` with the same digest.
    SingleAlgorithm(String),
    /// Every algorithm present in both records has the same digest and at
    /// least one algorithm is shared. Two records that only overlap on a weak
    /// algorithm compare equal under this mode.
    Overlapping,
    /// Identical algorithm sets with identical digests.
    Exact,
}

/// Outcome of checking an advertised record against a recomputed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    /// The recomputed digest for `algorithm` differs or is missing.
    Mismatch { algorithm: String },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Immutable map from lowercase algorithm name to Base64 digest.
///
/// Never empty. Iteration order is lexicographic by algorithm, which gives the
/// protocol a stable order to try algorithms in.
///
/// There is intentionally no `PartialEq`: callers pick a [`RecordComparison`].
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityRecord {
    hashes: BTreeMap<String, String>,
}

impl CapabilityRecord {
    /// Build a record from `(algo, digest)` pairs. Names are lowercased; a
    /// repeated algorithm keeps its last digest.
    pub fn new<I, A, D>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, D)>,
        A: AsRef<str>,
        D: Into<String>,
    {
        let hashes: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(algo, digest)| (normalize(algo.as_ref()), digest.into()))
            .collect();
        if hashes.is_empty() {
            return Err(CapsError::NoAlgorithmsRequested);
        }
        Ok(Self { hashes })
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.hashes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, algo: &str) -> bool {
        self.hashes.contains_key(&normalize(algo))
    }

    pub fn digest(&self, algo: &str) -> Option<&str> {
        self.hashes.get(&normalize(algo)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hashes.iter().map(|(a, d)| (a.as_str(), d.as_str()))
    }

    pub fn node_id(&self, algo: &str) -> Option<String> {
        let algo = normalize(algo);
        self.hashes.get(&algo).map(|digest| node_id(&algo, digest))
    }

    /// `(algorithm, node identifier)` for every algorithm, in record order.
    pub fn node_ids(&self) -> Vec<(String, String)> {
        self.hashes
            .iter()
            .map(|(algo, digest)| (algo.clone(), node_id(algo, digest)))
            .collect()
    }

    /// Keep only the algorithms accepted by `keep`. `None` when nothing is left.
    pub fn retain_algorithms(&self, mut keep: impl FnMut(&str) -> bool) -> Option<Self> {
        let hashes: BTreeMap<String, String> = self
            .hashes
            .iter()
            .filter(|(algo, _)| keep(algo))
            .map(|(a, d)| (a.clone(), d.clone()))
            .collect();
        if hashes.is_empty() {
            None
        } else {
            Some(Self { hashes })
        }
    }

    /// Primary comparison: same digest for one named algorithm.
    pub fn matches_on(&self, other: &Self, algo: &str) -> bool {
        match (self.digest(algo), other.digest(algo)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Partial-key equality over the algorithms both records carry.
    pub fn overlap_eq(&self, other: &Self) -> bool {
        let mut shared = 0usize;
        for (algo, digest) in &self.hashes {
            if let Some(theirs) = other.hashes.get(algo) {
                if theirs != digest {
                    return false;
                }
                shared += 1;
            }
        }
        shared > 0
    }

    /// Whole-record equality.
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.hashes == other.hashes
    }

    pub fn compare(&self, other: &Self, mode: &RecordComparison) -> bool {
        match mode {
            RecordComparison::SingleAlgorithm(algo) => self.matches_on(other, algo),
            RecordComparison::Overlapping => self.overlap_eq(other),
            RecordComparison::Exact => self.exact_eq(other),
        }
    }

    /// Check `self` (as advertised) against `recomputed`: every advertised
    /// algorithm must be present in `recomputed` with the same digest.
    pub fn verify_against(&self, recomputed: &Self) -> Verification {
        for (algo, digest) in &self.hashes {
            if recomputed.hashes.get(algo) != Some(digest) {
                return Verification::Mismatch {
                    algorithm: algo.clone(),
                };
            }
        }
        Verification::Verified
    }
}

impl fmt::Display for CapabilityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .hashes
            .iter()
            .map(|(algo, digest)| format!("{}={}", algo, digest))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
