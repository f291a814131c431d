//! # Strategy Module
//!
//! Enum-based cache/backend access strategies using dispatch pattern.
//!
//! ## Read Strategies
//! - `CacheFirst` - Check cache, fall back to the search backend on miss (default)
//! - `BackendOnly` - Skip cache entirely
//! - `CacheOnly` - Never hit the search backend
//! - `ReadThrough` - Always query the backend, populate cache
//!
//! The catalog has no write path through this layer, so there is no write
//! strategy: entries are only ever replaced by a later fill or expire.
//!
//! ## Example
//!
//! ```rust,ignore
//! use catalog_persistence::strategy::ReadStrategy;
//!
//! let film = ReadStrategy::CacheFirst
//!     .read(
//!         || cached(&key),
//!         || query(&request),
//!         |film: &Film| store(&key, film),
//!     )
//!     .await?;
//! ```

pub mod read_strategy;

pub use read_strategy::ReadStrategy;
