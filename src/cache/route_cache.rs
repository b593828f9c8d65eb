//! Cache de ruta del día
//!
//! La app de vendedor consulta "mi ruta de hoy" en cada apertura; este
//! módulo cachea ese payload y lo invalida en cada mutación de la ruta.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::{CacheOperations, RedisClient};

/// Cache del payload "ruta de hoy" por (tenant, vendedor, fecha)
#[derive(Clone)]
pub struct RouteCache {
    client: RedisClient,
    ttl: u64,
}

impl RouteCache {
    pub fn new(client: RedisClient, ttl: u64) -> Self {
        Self { client, ttl }
    }

    fn key(&self, tenant_id: Uuid, salesperson_id: Uuid, date: NaiveDate) -> String {
        self.client.today_route_key(
            &tenant_id.to_string(),
            &salesperson_id.to_string(),
            &date.format("%Y-%m-%d").to_string(),
        )
    }

    pub async fn get_today<T: DeserializeOwned>(
        &self,
        tenant_id: Uuid,
        salesperson_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<T>> {
        self.client.get(&self.key(tenant_id, salesperson_id, date)).await
    }

    pub async fn set_today<T: Serialize + Send + Sync>(
        &self,
        tenant_id: Uuid,
        salesperson_id: Uuid,
        date: NaiveDate,
        value: &T,
    ) -> Result<()> {
        self.client
            .set(&self.key(tenant_id, salesperson_id, date), value, self.ttl)
            .await
    }

    /// Invalidar tras cualquier mutación de la ruta del vendedor
    pub async fn invalidate(
        &self,
        tenant_id: Uuid,
        salesperson_id: Uuid,
        date: NaiveDate,
    ) -> Result<()> {
        self.client.delete(&self.key(tenant_id, salesperson_id, date)).await
    }
}
