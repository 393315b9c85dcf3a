//! Read-through cache with explicit freshness contracts, sitting in front of
//! `ColdHypergraphStorage` as the hot half of `HybridHypergraphStore`.
//!
//! # Design Philosophy
//!
//! Traditional caches hide their staleness, leading to subtle bugs. This
//! module makes staleness explicit: callers must specify their tolerance via
//! [`Freshness`], and reads return [`CacheRead<T>`] which carries staleness
//! metadata.

pub mod freshness;
pub mod lmdb_backend;
pub mod read_through;
pub mod traits;
pub mod watermark;

pub use freshness::{CacheRead, Freshness};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use read_through::{CacheConfig, ReadThroughCache, StorageFetcher};
pub use traits::{CacheBackend, CacheStats, CacheableEntity};
pub use watermark::{ChangeJournal, InMemoryChangeJournal, Watermark};
