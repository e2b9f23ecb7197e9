//! Two-tier capability cache.
//!
//! - `memory`: bounded LRU maps guarded by a mutex
//! - `store`: the [`PersistentCache`] trait and a one-file-per-node directory store
//! - `cache`: [`CapsCache`], node → profile and peer → record on top of both tiers

pub mod cache;
pub mod error;
pub mod memory;
pub mod store;

pub use cache::CapsCache;
pub use error::{Result, StoreError};
pub use memory::BoundedLru;
pub use store::{DirectoryStore, PersistentCache};
