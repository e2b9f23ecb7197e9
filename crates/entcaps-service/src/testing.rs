//! In-memory collaborators for protocol tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;

use entcaps_core::{CapsElement, DiscoveryProfile};
use parking_lot::Mutex;

use crate::collaborator::{
    DiscoveryClient, LocalProfileSource, NodeInfoProvider, PresenceSink, ResponderRegistry,
};
use crate::error::DiscoveryError;

type Answer = Result<Option<DiscoveryProfile>, DiscoveryError>;

#[derive(Default)]
pub struct FakeDiscovery {
    answers: Mutex<HashMap<String, Answer>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Option<Duration>,
}

impl FakeDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn answer(&self, node: &str, profile: DiscoveryProfile) {
        self.answers.lock().insert(node.to_string(), Ok(Some(profile)));
    }

    pub fn fail(&self, node: &str, error: DiscoveryError) {
        self.answers.lock().insert(node.to_string(), Err(error));
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl DiscoveryClient for FakeDiscovery {
    async fn query_info(&self, peer: &str, node: &str) -> Answer {
        self.calls.lock().push((peer.to_string(), node.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers.lock().get(node).cloned().unwrap_or(Ok(None))
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    published: Mutex<BTreeMap<String, Arc<dyn NodeInfoProvider>>>,
    unpublished: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn nodes(&self) -> Vec<String> {
        self.published.lock().keys().cloned().collect()
    }

    pub fn answer_for(&self, node: &str) -> Option<DiscoveryProfile> {
        self.published.lock().get(node).map(|p| p.info())
    }

    pub fn unpublished(&self) -> Vec<String> {
        self.unpublished.lock().clone()
    }
}

impl ResponderRegistry for FakeRegistry {
    fn publish_responder(&self, node: &str, provider: Arc<dyn NodeInfoProvider>) {
        self.published.lock().insert(node.to_string(), provider);
    }

    fn unpublish_responder(&self, node: &str) {
        self.published.lock().remove(node);
        self.unpublished.lock().push(node.to_string());
    }
}

pub struct FakeSource {
    profile: Mutex<DiscoveryProfile>,
}

impl FakeSource {
    pub fn new(profile: DiscoveryProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
        }
    }

    pub fn set(&self, profile: DiscoveryProfile) {
        *self.profile.lock() = profile;
    }
}

impl LocalProfileSource for FakeSource {
    fn snapshot(&self) -> DiscoveryProfile {
        self.profile.lock().clone()
    }
}

/// Profile source whose next snapshot blocks the calling thread after
/// reading the profile, until [`GatedSource::release`] is called.
pub struct GatedSource {
    profile: Mutex<DiscoveryProfile>,
    gate: Mutex<Option<(std_mpsc::Sender<()>, std_mpsc::Receiver<()>)>>,
    release_tx: Mutex<Option<std_mpsc::Sender<()>>>,
}

impl GatedSource {
    pub fn new(profile: DiscoveryProfile) -> Self {
        Self {
            profile: Mutex::new(profile),
            gate: Mutex::new(None),
            release_tx: Mutex::new(None),
        }
    }

    pub fn set(&self, profile: DiscoveryProfile) {
        *self.profile.lock() = profile;
    }

    /// Arm the gate for the next snapshot. The returned receiver fires once
    /// that snapshot has read the profile and is waiting.
    pub fn arm(&self) -> std_mpsc::Receiver<()> {
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        *self.gate.lock() = Some((entered_tx, release_rx));
        *self.release_tx.lock() = Some(release_tx);
        entered_rx
    }

    pub fn release(&self) {
        if let Some(tx) = self.release_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl LocalProfileSource for GatedSource {
    fn snapshot(&self) -> DiscoveryProfile {
        let profile = self.profile.lock().clone();
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        profile
    }
}

#[derive(Default)]
pub struct FakePresence {
    sent: Mutex<Vec<CapsElement>>,
}

impl FakePresence {
    pub fn sent(&self) -> Vec<CapsElement> {
        self.sent.lock().clone()
    }
}

#[async_trait::async_trait]
impl PresenceSink for FakePresence {
    async fn broadcast_caps(&self, caps: &CapsElement) -> Result<(), DiscoveryError> {
        self.sent.lock().push(caps.clone());
        Ok(())
    }
}
