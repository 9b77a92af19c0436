pub mod entry;
pub mod id;
pub mod store;
mod sweeper;

pub use entry::CacheEntry;
pub use id::{generate_cache_id, log_prefix};
pub use store::{ArtifactCache, CacheSettings, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
