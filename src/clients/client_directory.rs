//! Cliente del directorio de clientes
//!
//! Interfaz estrecha de solo lectura: nombre, dirección y coordenadas
//! para enriquecer las paradas del itinerario.

use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::errors::AppResult;

/// Datos de cliente para enriquecer paradas
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientInfo {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub struct ClientDirectoryClient {
    pool: PgPool,
}

impl ClientDirectoryClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Obtener clientes por id
    pub async fn find_by_ids(
        &self,
        tenant_id: Uuid,
        client_ids: &[Uuid],
    ) -> AppResult<Vec<ClientInfo>> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }

        let clients = sqlx::query_as::<_, ClientInfo>(
            r#"
            SELECT id, name, address, lat, lng
            FROM clients
            WHERE tenant_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(tenant_id)
        .bind(client_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Verificar que un cliente existe para el tenant
    pub async fn exists(&self, tenant_id: Uuid, client_id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(client_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
