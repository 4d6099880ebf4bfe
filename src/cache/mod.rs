//! Bounded, time-expiring caches for hot relational entities.

pub mod config;
mod lock;
pub mod store;

pub use config::CacheConfig;
pub use store::{CacheStore, EntityCache};
