//! Connection lifecycle events driving the manager.

use std::sync::Arc;

use entcaps_core::CapsElement;
use tokio::sync::mpsc;

use crate::manager::EntityCapsManager;
use crate::publish::{Publication, PublishTrigger};

#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Stream established with `server`, before authentication.
    Connected {
        server: String,
        stream_caps: Option<CapsElement>,
    },
    Authenticated {
        own_jid: String,
        resumed: bool,
        stream_caps: Option<CapsElement>,
    },
    /// The local discovery profile changed.
    ProfileChanged,
    /// A presence (or other stanza) from `peer` carried a caps element.
    CapsReceived { peer: String, caps: CapsElement },
    Disconnected,
}

impl EntityCapsManager {
    /// Apply one event. Publication errors are logged; they are configuration
    /// problems that retrying on the next event would not fix.
    pub async fn handle_event(&self, event: ConnectionEvent) -> Option<Publication> {
        let trigger = match event {
            ConnectionEvent::Connected {
                server,
                stream_caps,
            } => {
                self.set_server_domain(&server);
                self.ingest_stream_caps(stream_caps.as_ref());
                PublishTrigger::Connected
            }
            ConnectionEvent::Authenticated {
                own_jid,
                resumed,
                stream_caps,
            } => {
                self.publisher().set_own_jid(&own_jid);
                self.ingest_stream_caps(stream_caps.as_ref());
                PublishTrigger::Authenticated { resumed }
            }
            ConnectionEvent::ProfileChanged => PublishTrigger::ProfileChanged,
            ConnectionEvent::CapsReceived { peer, caps } => {
                self.on_caps_advertised(&peer, &caps);
                return None;
            }
            ConnectionEvent::Disconnected => {
                self.publisher().mark_disconnected();
                return None;
            }
        };

        match self.publisher().publish(trigger).await {
            Ok(publication) => publication,
            Err(e) => {
                tracing::error!(?trigger, error = %e, "local caps publication failed");
                None
            }
        }
    }

    /// Consume events until the sender side is dropped.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<ConnectionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!("caps event loop finished");
    }

    /// The server's stream feature binds its domain.
    fn ingest_stream_caps(&self, caps: Option<&CapsElement>) {
        let (Some(caps), Some(domain)) = (caps, self.server_domain()) else {
            return;
        };
        self.on_caps_advertised(&domain, caps);
    }
}
