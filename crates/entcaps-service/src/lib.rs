//! Entity capabilities protocol on top of `entcaps-core` and `entcaps-cache`.
//!
//! One [`CapsService`] per process owns the digest engine and the shared
//! cache. Each connection gets an [`EntityCapsManager`] wired to the host
//! through the traits in [`collaborator`], and is driven either directly or
//! by feeding [`ConnectionEvent`]s into [`EntityCapsManager::run`].

pub mod collaborator;
pub mod error;
pub mod events;
pub mod manager;
pub mod publish;
mod resolve;
pub mod service;

#[cfg(test)]
mod testing;

pub use collaborator::{
    DiscoveryClient, LocalProfileSource, NodeInfoProvider, PresenceSink, ResponderRegistry,
    SnapshotProvider,
};
pub use error::{DiscoveryError, ResolveError};
pub use events::ConnectionEvent;
pub use manager::EntityCapsManager;
pub use publish::{LocalPublisher, Publication, PublishTrigger};
pub use service::CapsService;
