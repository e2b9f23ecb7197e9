//! Verified lookup of a peer's profile from its advertised record.

use std::sync::Arc;

use entcaps_core::{CapabilityRecord, DiscoveryProfile, Verification};

use crate::collaborator::DiscoveryClient;
use crate::error::{DiscoveryError, ResolveError};
use crate::service::CapsService;

impl CapsService {
    /// Resolve the profile behind `advertised`.
    ///
    /// Cached profiles are returned without network I/O. Otherwise the peer
    /// is queried once per node identifier, in algorithm order, until one
    /// answer is non-empty. That answer is re-hashed with every advertised
    /// algorithm and accepted only if all digests match; it is then cached
    /// under every node identifier and bound to `peer`.
    ///
    /// `Ok(None)` means "capabilities unknown": nothing verifiable was
    /// advertised, the answer did not verify, or the query timed out or was
    /// interrupted. The cache is only written after full verification.
    pub async fn resolve(
        &self,
        client: &dyn DiscoveryClient,
        peer: &str,
        advertised: &CapabilityRecord,
    ) -> Result<Option<Arc<DiscoveryProfile>>, ResolveError> {
        let Some(record) = advertised.retain_algorithms(|algo| self.engine.supports(algo)) else {
            tracing::debug!(peer = %peer, record = %advertised, "no verifiable algorithm advertised");
            return Ok(None);
        };
        let nodes = record.node_ids();

        for (_, node) in &nodes {
            if let Some(profile) = self.cache.get_profile(node) {
                tracing::trace!(peer = %peer, node = %node, "caps cache hit");
                self.cache.put_peer_binding(peer, record);
                return Ok(Some(profile));
            }
        }

        let Some(candidate) = self.query_first(client, peer, &nodes).await? else {
            return Ok(None);
        };

        let algorithms: Vec<&str> = record.algorithms().collect();
        let recomputed = match self.engine.hash_profile(&candidate, &algorithms) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "cannot hash discovered profile");
                return Ok(None);
            }
        };

        match record.verify_against(&recomputed) {
            Verification::Verified => {
                let profile = Arc::new(candidate);
                for (_, node) in &nodes {
                    self.cache.put_profile(node, (*profile).clone());
                }
                self.cache.put_peer_binding(peer, record);
                tracing::debug!(peer = %peer, nodes = nodes.len(), "verified and cached profile");
                Ok(Some(profile))
            }
            Verification::Mismatch { algorithm } => {
                tracing::warn!(
                    peer = %peer,
                    algo = %algorithm,
                    advertised = %record,
                    computed = %recomputed,
                    "capability hash mismatch, discarding profile"
                );
                Ok(None)
            }
        }
    }

    /// Query node identifiers in order until one yields a non-empty profile.
    async fn query_first(
        &self,
        client: &dyn DiscoveryClient,
        peer: &str,
        nodes: &[(String, String)],
    ) -> Result<Option<DiscoveryProfile>, ResolveError> {
        let timeout = self.config.query_timeout;
        for (algo, node) in nodes {
            let answer = match tokio::time::timeout(timeout, client.query_info(peer, node)).await {
                Ok(answer) => answer,
                Err(_) => {
                    tracing::warn!(peer = %peer, node = %node, ?timeout, "disco#info query timed out");
                    return Ok(None);
                }
            };
            match answer {
                Ok(Some(profile)) if !profile.is_empty() => return Ok(Some(profile)),
                Ok(_) => {
                    tracing::debug!(peer = %peer, algo = %algo, "empty disco#info answer");
                }
                // An error stanza is scoped to this node; another algorithm's node may answer.
                Err(DiscoveryError::Remote { condition, .. }) => {
                    tracing::debug!(peer = %peer, node = %node, condition = %condition, "disco#info error");
                }
                Err(DiscoveryError::Interrupted) => {
                    tracing::debug!(peer = %peer, "disco#info query interrupted");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}
