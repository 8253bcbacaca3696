//! On-disk response cache
//!
//! Repeated runs against already-visited pages are served from disk instead
//! of the network. The cache belongs to no session; every session built from
//! the same configuration shares it.

mod file_cache;

pub use file_cache::{CachedResponse, ResponseCache};
