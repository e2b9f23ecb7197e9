//! Seams to the host XMPP connection.
//!
//! The capability subsystem never touches sockets or stanzas itself; it asks
//! the host to run disco#info queries, to answer them for local nodes, and to
//! send presence.

use std::sync::Arc;

use entcaps_core::{CapsElement, DiscoveryProfile};

use crate::error::DiscoveryError;

/// Outbound `disco#info` queries.
#[async_trait::async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// Query `peer` for the profile behind `node`. `Ok(None)` means the peer
    /// answered without a usable profile.
    async fn query_info(
        &self,
        peer: &str,
        node: &str,
    ) -> Result<Option<DiscoveryProfile>, DiscoveryError>;
}

/// Answers incoming `disco#info` queries for one node.
pub trait NodeInfoProvider: Send + Sync {
    fn info(&self) -> DiscoveryProfile;
}

/// A provider that always answers with a fixed snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    profile: Arc<DiscoveryProfile>,
}

impl SnapshotProvider {
    pub fn new(profile: Arc<DiscoveryProfile>) -> Self {
        Self { profile }
    }
}

impl NodeInfoProvider for SnapshotProvider {
    fn info(&self) -> DiscoveryProfile {
        (*self.profile).clone()
    }
}

/// Registration of local disco#info responders.
pub trait ResponderRegistry: Send + Sync {
    fn publish_responder(&self, node: &str, provider: Arc<dyn NodeInfoProvider>);

    fn unpublish_responder(&self, node: &str);
}

/// Read-only view of the local entity's current profile.
pub trait LocalProfileSource: Send + Sync {
    fn snapshot(&self) -> DiscoveryProfile;
}

/// Outbound presence carrying the local capability element.
#[async_trait::async_trait]
pub trait PresenceSink: Send + Sync {
    async fn broadcast_caps(&self, caps: &CapsElement) -> Result<(), DiscoveryError>;
}
