//! Per-connection entry point tying ingest, lookup and publication together.

use std::sync::Arc;

use entcaps_core::{CapabilityRecord, CapsElement, DiscoveryProfile};
use parking_lot::RwLock;

use crate::collaborator::{DiscoveryClient, LocalProfileSource, PresenceSink, ResponderRegistry};
use crate::error::ResolveError;
use crate::publish::LocalPublisher;
use crate::service::CapsService;

pub struct EntityCapsManager {
    service: Arc<CapsService>,
    client: Arc<dyn DiscoveryClient>,
    publisher: LocalPublisher,
    server_domain: RwLock<Option<String>>,
}

impl EntityCapsManager {
    pub fn new(
        service: Arc<CapsService>,
        client: Arc<dyn DiscoveryClient>,
        registry: Arc<dyn ResponderRegistry>,
        source: Arc<dyn LocalProfileSource>,
        presence: Arc<dyn PresenceSink>,
    ) -> Self {
        let publisher = LocalPublisher::new(Arc::clone(&service), registry, source, presence);
        Self {
            service,
            client,
            publisher,
            server_domain: RwLock::new(None),
        }
    }

    pub fn service(&self) -> &Arc<CapsService> {
        &self.service
    }

    pub fn publisher(&self) -> &LocalPublisher {
        &self.publisher
    }

    pub fn server_domain(&self) -> Option<String> {
        self.server_domain.read().clone()
    }

    pub(crate) fn set_server_domain(&self, domain: &str) {
        *self.server_domain.write() = Some(domain.to_string());
    }

    /// Record what `peer` advertises.
    ///
    /// Hashes with an algorithm that is not allow-listed or has no provider
    /// are dropped. If none remain the advertisement is ignored and any
    /// previous binding stays; otherwise the binding is overwritten.
    pub fn on_caps_advertised(&self, peer: &str, caps: &CapsElement) -> Option<CapabilityRecord> {
        let engine = &self.service.engine;
        let usable: Vec<(&str, &str)> = caps
            .hashes
            .iter()
            .filter(|h| engine.supports(&h.algo))
            .map(|h| (h.algo.as_str(), h.digest.as_str()))
            .collect();
        let Ok(record) = CapabilityRecord::new(usable) else {
            tracing::debug!(peer = %peer, "caps advertisement without usable hashes ignored");
            return None;
        };
        self.service.cache.put_peer_binding(peer, record.clone());
        tracing::trace!(peer = %peer, record = %record, "caps binding updated");
        Some(record)
    }

    /// Verified profile for `peer`'s current binding, from cache only.
    pub fn cached_profile(&self, peer: &str) -> Option<Arc<DiscoveryProfile>> {
        self.service.cache.profile_for_peer(peer)
    }

    /// Resolve `advertised` for `peer` through this connection's discovery
    /// client. See [`CapsService::resolve`].
    pub async fn resolve(
        &self,
        peer: &str,
        advertised: &CapabilityRecord,
    ) -> Result<Option<Arc<DiscoveryProfile>>, ResolveError> {
        self.service
            .resolve(self.client.as_ref(), peer, advertised)
            .await
    }

    /// Resolve whatever `peer` currently advertises. `Ok(None)` without a
    /// binding.
    pub async fn resolve_peer(
        &self,
        peer: &str,
    ) -> Result<Option<Arc<DiscoveryProfile>>, ResolveError> {
        match self.service.cache.get_peer_binding(peer) {
            Some(record) => self.resolve(peer, &record).await,
            None => Ok(None),
        }
    }
}
