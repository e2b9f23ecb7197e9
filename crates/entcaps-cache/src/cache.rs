//! Node → profile and peer → record caches over a memory tier and an
//! optional persistent tier.
//!
//! Invariant: every profile handed out for a node hashes to that node. Memory
//! entries are trusted because only verified profiles are inserted; entries
//! read back from the persistent tier are re-hashed before promotion.

use std::sync::Arc;

use entcaps_core::{parse_node_id, CapabilityRecord, CapsConfig, DigestEngine, DiscoveryProfile};
use parking_lot::RwLock;

use crate::error::Result;
use crate::memory::BoundedLru;
use crate::store::{DirectoryStore, PersistentCache};

pub struct CapsCache {
    engine: Arc<DigestEngine>,
    profiles: BoundedLru<String, Arc<DiscoveryProfile>>,
    peers: BoundedLru<String, CapabilityRecord>,
    persistent: RwLock<Option<Arc<dyn PersistentCache>>>,
}

impl CapsCache {
    /// Memory-only cache sized from `config`. `cache_dir` is not touched.
    pub fn new(engine: Arc<DigestEngine>, config: &CapsConfig) -> Self {
        Self::with_capacity(
            engine,
            config.profile_cache_capacity,
            config.peer_cache_capacity,
        )
    }

    pub fn with_capacity(
        engine: Arc<DigestEngine>,
        profile_capacity: usize,
        peer_capacity: usize,
    ) -> Self {
        Self {
            engine,
            profiles: BoundedLru::new(profile_capacity),
            peers: BoundedLru::new(peer_capacity),
            persistent: RwLock::new(None),
        }
    }

    /// Like [`CapsCache::new`], and attach a [`DirectoryStore`] when
    /// `config.cache_dir` is set. The directory must already exist.
    pub fn open(engine: Arc<DigestEngine>, config: &CapsConfig) -> Result<Self> {
        let cache = Self::new(engine, config);
        if let Some(dir) = &config.cache_dir {
            let store = DirectoryStore::open(dir)?;
            tracing::info!(dir = %store.dir().display(), "persistent caps cache enabled");
            cache.set_persistent(Some(Arc::new(store)));
        }
        Ok(cache)
    }

    /// Attach, replace or (with `None`) detach the persistent tier.
    pub fn set_persistent(&self, store: Option<Arc<dyn PersistentCache>>) {
        *self.persistent.write() = store;
    }

    pub fn has_persistent(&self) -> bool {
        self.persistent.read().is_some()
    }

    fn persistent(&self) -> Option<Arc<dyn PersistentCache>> {
        self.persistent.read().clone()
    }

    pub fn engine(&self) -> &Arc<DigestEngine> {
        &self.engine
    }

    // ─── Node → profile ─────────────────────────────────────────────────────

    /// Cache `profile` under `node`.
    ///
    /// The caller must already have verified that `profile` hashes to `node`.
    /// A failing persistent write is logged and the memory entry kept.
    pub fn put_profile(&self, node: &str, profile: DiscoveryProfile) {
        let profile = Arc::new(profile);
        if let Some((evicted, _)) = self.profiles.put(node.to_string(), Arc::clone(&profile)) {
            tracing::trace!(node = %evicted, "evicted profile from memory tier");
        }
        if let Some(store) = self.persistent() {
            if let Err(e) = store.put(node, &profile) {
                tracing::warn!(node = %node, error = %e, "failed to persist profile");
            }
        }
    }

    /// Memory first, then the persistent tier. A persistent hit is verified
    /// against `node` and promoted into memory; anything that fails to read
    /// or verify is treated as absent.
    pub fn get_profile(&self, node: &str) -> Option<Arc<DiscoveryProfile>> {
        if let Some(profile) = self.profiles.get(&node.to_string()) {
            return Some(profile);
        }

        let store = self.persistent()?;
        let profile = match store.lookup(node) {
            Ok(Some(p)) => p,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(node = %node, error = %e, "unreadable persistent cache entry");
                return None;
            }
        };

        if !self.hashes_to(node, &profile) {
            return None;
        }

        let profile = Arc::new(profile);
        self.profiles.put(node.to_string(), Arc::clone(&profile));
        tracing::debug!(node = %node, "promoted profile from persistent tier");
        Some(profile)
    }

    fn hashes_to(&self, node: &str, profile: &DiscoveryProfile) -> bool {
        let Some((algo, digest)) = parse_node_id(node) else {
            tracing::warn!(node = %node, "persistent entry under a foreign node identifier");
            return false;
        };
        match self.engine.hash_profile(profile, &[algo.as_str()]) {
            Ok(record) if record.digest(&algo) == Some(digest.as_str()) => true,
            Ok(_) => {
                tracing::warn!(node = %node, algo = %algo, "persistent entry does not match its node");
                false
            }
            Err(e) => {
                tracing::warn!(node = %node, algo = %algo, error = %e, "cannot verify persistent entry");
                false
            }
        }
    }

    // ─── Peer → record ──────────────────────────────────────────────────────

    /// Overwrite the record advertised by `peer`.
    pub fn put_peer_binding(&self, peer: &str, record: CapabilityRecord) {
        self.peers.put(peer.to_string(), record);
    }

    pub fn get_peer_binding(&self, peer: &str) -> Option<CapabilityRecord> {
        self.peers.get(&peer.to_string())
    }

    pub fn remove_peer_binding(&self, peer: &str) -> Option<CapabilityRecord> {
        self.peers.remove(&peer.to_string())
    }

    /// Cached profile for the record `peer` currently advertises, trying the
    /// record's node identifiers in algorithm order. No network I/O.
    pub fn profile_for_peer(&self, peer: &str) -> Option<Arc<DiscoveryProfile>> {
        let record = self.get_peer_binding(peer)?;
        record
            .node_ids()
            .into_iter()
            .find_map(|(_, node)| self.get_profile(&node))
    }

    // ─── Maintenance ────────────────────────────────────────────────────────

    /// Empty both memory tiers. The persistent tier is left alone.
    pub fn clear(&self) {
        self.profiles.clear();
        self.peers.clear();
    }

    /// Delete every persistent entry. Returns how many were removed, or 0
    /// without a persistent tier.
    pub fn clear_persistent(&self) -> Result<usize> {
        match self.persistent() {
            Some(store) => {
                let removed = store.clear()?;
                tracing::info!(removed, "cleared persistent caps cache");
                Ok(removed)
            }
            None => Ok(0),
        }
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

impl std::fmt::Debug for CapsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsCache")
            .field("profiles", &self.profiles.len())
            .field("peers", &self.peers.len())
            .field("persistent", &self.has_persistent())
            .finish()
    }
}
