//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;

use crate::cache::{RedisClient, RouteCache};
use crate::config::environment::EnvironmentConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub redis: RedisClient,
    pub route_cache: RouteCache,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, redis: RedisClient) -> Self {
        let route_cache = RouteCache::new(redis.clone(), config.cache_ttl_seconds);
        Self {
            pool,
            config,
            redis,
            route_cache,
        }
    }
}
