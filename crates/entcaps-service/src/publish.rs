//! Local publication: hash the local profile, make it answerable, and tell
//! peers about it.

use std::collections::VecDeque;
use std::sync::Arc;

use entcaps_core::{CapabilityRecord, CapsElement, CapsError, DiscoveryProfile};
use parking_lot::Mutex;

use crate::collaborator::{LocalProfileSource, PresenceSink, ResponderRegistry, SnapshotProvider};
use crate::service::CapsService;

/// What caused a publication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTrigger {
    Connected,
    Authenticated { resumed: bool },
    ProfileChanged,
}

/// Result of a publication that was not skipped.
#[derive(Debug, Clone)]
pub struct Publication {
    pub record: CapabilityRecord,
    /// Node identifier for the default algorithm.
    pub node: String,
    /// The record differs from the previously published one.
    pub changed: bool,
    pub presence_sent: bool,
    /// Node identifiers whose responders were retired by this publication.
    pub retired: Vec<String>,
}

#[derive(Default)]
struct PublishState {
    current: Option<CapabilityRecord>,
    /// Oldest first; the newest entry equals `current`.
    retained: VecDeque<CapabilityRecord>,
    own_jid: Option<String>,
    authenticated: bool,
}

/// Publication lifecycle of one connection.
pub struct LocalPublisher {
    service: Arc<CapsService>,
    registry: Arc<dyn ResponderRegistry>,
    source: Arc<dyn LocalProfileSource>,
    presence: Arc<dyn PresenceSink>,
    state: Mutex<PublishState>,
    /// Held for a whole publication, presence included, so concurrent
    /// triggers apply and broadcast in the same order.
    in_flight: tokio::sync::Mutex<()>,
}

impl LocalPublisher {
    pub fn new(
        service: Arc<CapsService>,
        registry: Arc<dyn ResponderRegistry>,
        source: Arc<dyn LocalProfileSource>,
        presence: Arc<dyn PresenceSink>,
    ) -> Self {
        Self {
            service,
            registry,
            source,
            presence,
            state: Mutex::new(PublishState::default()),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// The record currently advertised, if anything was published yet.
    pub fn current(&self) -> Option<CapabilityRecord> {
        self.state.lock().current.clone()
    }

    /// Records whose responders are still registered, oldest first.
    pub fn retained(&self) -> Vec<CapabilityRecord> {
        self.state.lock().retained.iter().cloned().collect()
    }

    /// Bind `jid` to the local record now and after every publication.
    pub fn set_own_jid(&self, jid: &str) {
        let mut state = self.state.lock();
        state.own_jid = Some(jid.to_string());
        if let Some(current) = &state.current {
            self.service.cache.put_peer_binding(jid, current.clone());
        }
    }

    /// The session is gone; presence is not sent until the next
    /// authentication.
    pub fn mark_disconnected(&self) {
        self.state.lock().authenticated = false;
    }

    /// Run one publication. Returns `Ok(None)` when a resumed session finds
    /// the profile unchanged and nothing needs to happen.
    pub async fn publish(&self, trigger: PublishTrigger) -> Result<Option<Publication>, CapsError> {
        let _in_flight = self.in_flight.lock().await;
        // Snapshot only once this publication owns the slot; an older
        // snapshot must never overtake a newer one.
        let profile = self.source.snapshot();
        let record = self
            .service
            .engine
            .hash_profile(&profile, &self.service.config.algorithms)?;
        let default_algo = self.service.config.default_algorithm();
        let node = record
            .node_id(default_algo)
            .ok_or_else(|| CapsError::ProviderRequired(default_algo.to_string()))?;

        let (changed, retired, send_presence) = {
            let mut state = self.state.lock();
            let changed = state
                .current
                .as_ref()
                .map_or(true, |current| !current.exact_eq(&record));

            if let PublishTrigger::Authenticated { resumed } = trigger {
                state.authenticated = true;
                if resumed && !changed {
                    tracing::debug!(node = %node, "resumed session, caps unchanged");
                    return Ok(None);
                }
            }

            self.install(&profile, &record);
            let retired = if changed {
                state.current = Some(record.clone());
                state.retained.push_back(record.clone());
                self.trim(&mut state.retained)
            } else {
                Vec::new()
            };
            if let Some(jid) = &state.own_jid {
                self.service.cache.put_peer_binding(jid, record.clone());
            }

            let fresh_session = trigger == PublishTrigger::Authenticated { resumed: false };
            let send_presence = state.authenticated && (changed || fresh_session);
            (changed, retired, send_presence)
        };

        if changed {
            tracing::info!(node = %node, record = %record, "published local caps");
        }

        let mut presence_sent = false;
        if send_presence {
            match self
                .presence
                .broadcast_caps(&CapsElement::from_record(&record))
                .await
            {
                Ok(()) => presence_sent = true,
                Err(e) => tracing::warn!(node = %node, error = %e, "caps presence not sent"),
            }
        }

        Ok(Some(Publication {
            record,
            node,
            changed,
            presence_sent,
            retired,
        }))
    }

    /// Cache the profile under every node identifier, then register the
    /// responders. A registered node is therefore always already cached.
    fn install(&self, profile: &DiscoveryProfile, record: &CapabilityRecord) {
        let snapshot = Arc::new(profile.clone());
        let nodes = record.node_ids();
        for (_, node) in &nodes {
            self.service.cache.put_profile(node, profile.clone());
        }
        for (_, node) in &nodes {
            self.registry
                .publish_responder(node, Arc::new(SnapshotProvider::new(Arc::clone(&snapshot))));
        }
    }

    /// Pop records beyond the retention bound and unregister nodes no
    /// remaining record still uses.
    fn trim(&self, retained: &mut VecDeque<CapabilityRecord>) -> Vec<String> {
        let bound = self.service.config.retained_hashes.max(1);
        let mut retired = Vec::new();
        while retained.len() > bound {
            let Some(oldest) = retained.pop_front() else {
                break;
            };
            for (_, node) in oldest.node_ids() {
                let still_used = retained
                    .iter()
                    .any(|r| r.node_ids().iter().any(|(_, n)| *n == node));
                if !still_used {
                    self.registry.unpublish_responder(&node);
                    tracing::debug!(node = %node, "retired caps responder");
                    retired.push(node);
                }
            }
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use entcaps_cache::CapsCache;
    use entcaps_core::{CapsConfig, DigestEngine, Identity};

    use super::*;
    use crate::testing::{FakePresence, FakeRegistry, FakeSource, GatedSource};

    struct Harness {
        service: Arc<CapsService>,
        registry: Arc<FakeRegistry>,
        source: Arc<FakeSource>,
        presence: Arc<FakePresence>,
        publisher: LocalPublisher,
    }

    fn harness(config: CapsConfig) -> Harness {
        let engine = Arc::new(DigestEngine::new());
        let cache = Arc::new(CapsCache::new(Arc::clone(&engine), &config));
        let service = Arc::new(CapsService::new(engine, cache, config));
        let registry = Arc::new(FakeRegistry::default());
        let source = Arc::new(FakeSource::new(profile(0)));
        let presence = Arc::new(FakePresence::default());
        let publisher = LocalPublisher::new(
            Arc::clone(&service),
            registry.clone(),
            source.clone(),
            presence.clone(),
        );
        Harness {
            service,
            registry,
            source,
            presence,
            publisher,
        }
    }

    fn profile(version: usize) -> DiscoveryProfile {
        DiscoveryProfile::new()
            .with_identity(Identity::new("client", "pc").with_name("entcaps"))
            .with_feature("urn:xmpp:ping")
            .with_feature(format!("urn:example:v{}", version))
    }

    #[tokio::test]
    async fn test_connect_then_authenticate() {
        let h = harness(CapsConfig::default().with_algorithms(["sha-256", "sha-512"]));

        let first = h.publisher.publish(PublishTrigger::Connected).await.unwrap().unwrap();
        assert!(first.changed);
        assert!(!first.presence_sent);
        assert!(first.node.starts_with("urn:xmpp:caps#sha-256."));
        assert_eq!(h.registry.nodes().len(), 2);
        for (_, node) in first.record.node_ids() {
            assert_eq!(h.service.cache.get_profile(&node).as_deref(), Some(&profile(0)));
            assert_eq!(h.registry.answer_for(&node), Some(profile(0)));
        }

        let auth = h
            .publisher
            .publish(PublishTrigger::Authenticated { resumed: false })
            .await
            .unwrap()
            .unwrap();
        assert!(!auth.changed);
        assert!(auth.presence_sent);
        assert_eq!(h.presence.sent().len(), 1);
        assert_eq!(h.publisher.retained().len(), 1);
    }

    #[tokio::test]
    async fn test_resumed_without_change_is_skipped() {
        let h = harness(CapsConfig::default());
        h.publisher.publish(PublishTrigger::Connected).await.unwrap();
        let outcome = h
            .publisher
            .publish(PublishTrigger::Authenticated { resumed: true })
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(h.presence.sent().is_empty());
    }

    #[tokio::test]
    async fn test_resumed_with_change_broadcasts() {
        let h = harness(CapsConfig::default());
        h.publisher.publish(PublishTrigger::Connected).await.unwrap();
        h.source.set(profile(1));
        let outcome = h
            .publisher
            .publish(PublishTrigger::Authenticated { resumed: true })
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.changed);
        assert!(outcome.presence_sent);
    }

    #[tokio::test]
    async fn test_profile_change_rebroadcasts_only_when_changed() {
        let h = harness(CapsConfig::default());
        h.publisher
            .publish(PublishTrigger::Authenticated { resumed: false })
            .await
            .unwrap();
        assert_eq!(h.presence.sent().len(), 1);

        let same = h
            .publisher
            .publish(PublishTrigger::ProfileChanged)
            .await
            .unwrap()
            .unwrap();
        assert!(!same.changed);
        assert_eq!(h.presence.sent().len(), 1);

        h.source.set(profile(1));
        let changed = h
            .publisher
            .publish(PublishTrigger::ProfileChanged)
            .await
            .unwrap()
            .unwrap();
        assert!(changed.changed);
        assert_eq!(h.presence.sent().len(), 2);
        let advertised = h.presence.sent()[1].clone().into_record().unwrap();
        assert!(advertised.exact_eq(&changed.record));
    }

    #[tokio::test]
    async fn test_no_presence_after_disconnect() {
        let h = harness(CapsConfig::default());
        h.publisher
            .publish(PublishTrigger::Authenticated { resumed: false })
            .await
            .unwrap();
        h.publisher.mark_disconnected();
        h.source.set(profile(1));
        let outcome = h
            .publisher
            .publish(PublishTrigger::ProfileChanged)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.changed);
        assert!(!outcome.presence_sent);
        assert_eq!(h.presence.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_retention_bound_retires_oldest() {
        let h = harness(CapsConfig::default().with_retained_hashes(2));
        let mut nodes = Vec::new();
        for v in 0..3 {
            h.source.set(profile(v));
            let p = h
                .publisher
                .publish(PublishTrigger::ProfileChanged)
                .await
                .unwrap()
                .unwrap();
            nodes.push(p.node.clone());
            if v == 2 {
                assert_eq!(p.retired, vec![nodes[0].clone()]);
            }
        }
        assert_eq!(h.publisher.retained().len(), 2);
        assert_eq!(h.registry.unpublished(), vec![nodes[0].clone()]);
        let mut registered = h.registry.nodes();
        registered.sort();
        let mut expected = vec![nodes[1].clone(), nodes[2].clone()];
        expected.sort();
        assert_eq!(registered, expected);
    }

    #[tokio::test]
    async fn test_reverting_profile_keeps_shared_node() {
        let h = harness(CapsConfig::default().with_retained_hashes(2));
        for v in [0, 1, 0] {
            h.source.set(profile(v));
            h.publisher
                .publish(PublishTrigger::ProfileChanged)
                .await
                .unwrap();
        }
        // v0 was popped, but its node is still the current one.
        let current = h.publisher.current().unwrap();
        let node = current.node_id("sha-256").unwrap();
        assert!(h.registry.nodes().contains(&node));
        assert!(h.registry.unpublished().is_empty());
    }

    #[tokio::test]
    async fn test_own_jid_bound_to_record() {
        let h = harness(CapsConfig::default());
        h.publisher.set_own_jid("romeo@montague.lit/orchard");
        let p = h
            .publisher
            .publish(PublishTrigger::Connected)
            .await
            .unwrap()
            .unwrap();
        let bound = h
            .service
            .cache
            .get_peer_binding("romeo@montague.lit/orchard")
            .unwrap();
        assert!(bound.exact_eq(&p.record));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_publications_keep_newest() {
        let config = CapsConfig::default();
        let engine = Arc::new(DigestEngine::new());
        let cache = Arc::new(CapsCache::new(Arc::clone(&engine), &config));
        let service = Arc::new(CapsService::new(engine, cache, config));
        let source = Arc::new(GatedSource::new(profile(0)));
        let presence = Arc::new(FakePresence::default());
        let publisher = Arc::new(LocalPublisher::new(
            Arc::clone(&service),
            Arc::new(FakeRegistry::default()),
            source.clone(),
            presence.clone(),
        ));
        publisher
            .publish(PublishTrigger::Authenticated { resumed: false })
            .await
            .unwrap();

        // The first publication reads v1 and stalls inside the snapshot.
        source.set(profile(1));
        let entered = source.arm();
        let first = tokio::spawn({
            let publisher = Arc::clone(&publisher);
            async move { publisher.publish(PublishTrigger::ProfileChanged).await }
        });
        tokio::task::spawn_blocking(move || entered.recv())
            .await
            .unwrap()
            .unwrap();

        // A newer profile is published while the first one is still stalled.
        source.set(profile(2));
        let second = tokio::spawn({
            let publisher = Arc::clone(&publisher);
            async move { publisher.publish(PublishTrigger::ProfileChanged).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        source.release();

        let first = first.await.unwrap().unwrap().unwrap();
        let second = second.await.unwrap().unwrap().unwrap();
        let newest = service
            .engine
            .hash_profile(&profile(2), &service.config.algorithms)
            .unwrap();
        assert!(first.changed);
        assert!(second.changed);
        assert!(second.record.exact_eq(&newest));
        assert!(publisher.current().unwrap().exact_eq(&newest));
        assert!(publisher.retained().last().unwrap().exact_eq(&newest));

        let sent = presence.sent();
        assert_eq!(sent.len(), 3);
        let last = sent.last().unwrap().clone().into_record().unwrap();
        assert!(last.exact_eq(&newest));
    }

    #[tokio::test]
    async fn test_unsupported_algorithm_fails() {
        let h = harness(CapsConfig::default().with_algorithms(["sha3-256"]));
        let err = h
            .publisher
            .publish(PublishTrigger::Connected)
            .await
            .unwrap_err();
        assert_eq!(err, CapsError::ProviderRequired("sha3-256".to_string()));
        assert!(h.registry.nodes().is_empty());
    }
}
