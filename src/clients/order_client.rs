//! Cliente del servicio de pedidos
//!
//! Interfaz estrecha de solo lectura hacia los pedidos confirmados:
//! encabezado y líneas para el attach/detach, y el listado de pedidos
//! disponibles para adjuntar.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::pedido::{PedidoHeader, PedidoLine};
use crate::utils::errors::AppResult;

pub struct OrderClient {
    pool: PgPool,
}

impl OrderClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Obtener el encabezado de un pedido
    pub async fn find_header(
        &self,
        tenant_id: Uuid,
        pedido_id: Uuid,
    ) -> AppResult<Option<PedidoHeader>> {
        let header = sqlx::query_as::<_, PedidoHeader>(
            r#"
            SELECT pd.id, pd.tenant_id, pd.client_id, c.name AS client_name,
                   pd.pedido_date, pd.total_amount, pd.status
            FROM pedidos pd
            JOIN clients c ON c.id = pd.client_id AND c.tenant_id = pd.tenant_id
            WHERE pd.id = $1 AND pd.tenant_id = $2
            "#,
        )
        .bind(pedido_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    /// Obtener las líneas de un pedido
    pub async fn find_lines(
        &self,
        tenant_id: Uuid,
        pedido_id: Uuid,
    ) -> AppResult<Vec<PedidoLine>> {
        let lines = sqlx::query_as::<_, PedidoLine>(
            r#"
            SELECT pl.pedido_id, pl.product_id, pl.quantity, pl.unit_price
            FROM pedido_lineas pl
            JOIN pedidos pd ON pd.id = pl.pedido_id
            WHERE pl.pedido_id = $1 AND pd.tenant_id = $2
            ORDER BY pl.product_id
            "#,
        )
        .bind(pedido_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Pedidos confirmados del tenant sin vínculo activo a ninguna ruta
    pub async fn find_attachable(
        &self,
        tenant_id: Uuid,
    ) -> AppResult<Vec<PedidoHeader>> {
        let pedidos = sqlx::query_as::<_, PedidoHeader>(
            r#"
            SELECT pd.id, pd.tenant_id, pd.client_id, c.name AS client_name,
                   pd.pedido_date, pd.total_amount, pd.status
            FROM pedidos pd
            JOIN clients c ON c.id = pd.client_id AND c.tenant_id = pd.tenant_id
            WHERE pd.tenant_id = $1
              AND pd.status = 'confirmed'
              AND NOT EXISTS (
                  SELECT 1 FROM route_pedidos rp
                  WHERE rp.pedido_id = pd.id AND rp.active = true
              )
            ORDER BY pd.pedido_date, pd.id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pedidos)
    }
}
