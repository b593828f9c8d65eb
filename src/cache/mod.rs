//! Cache
//!
//! Este módulo contiene los sistemas de cache.

pub mod cache_config;
pub mod redis_client;
pub mod route_cache;

pub use cache_config::{CacheConfig, CacheOperations};
pub use redis_client::RedisClient;
pub use route_cache::RouteCache;
