//! Configuración del cache
//!
//! Este módulo define la configuración de Redis y el trait de operaciones
//! de cache que implementan los clientes.

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Configuración del cache Redis
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub redis_url: String,
    pub default_ttl: u64,
    pub max_connections: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl: 300,
            max_connections: 10,
        }
    }
}

/// Operaciones básicas de cache
#[async_trait::async_trait]
pub trait CacheOperations {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
