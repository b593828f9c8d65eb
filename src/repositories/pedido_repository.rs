//! Repositorio de Pedidos adjuntos
//!
//! Acceso a datos del vínculo ruta-pedido. El attach expande las líneas
//! del pedido hacia el ledger de carga y el detach revierte exactamente
//! esa expansión; ambos corren como una sola transacción, de modo que un
//! fallo a media vuelta no deja el ledger a medias.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::pedido::{PedidoLine, RoutePedido};
use crate::repositories::carga_repository::CargaRepository;
use crate::utils::errors::AppError;

pub struct PedidoRepository {
    pool: PgPool,
}

impl PedidoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Vínculo activo del par (ruta, pedido), si existe
    pub async fn find_active(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        pedido_id: Uuid,
    ) -> Result<Option<RoutePedido>, AppError> {
        let attachment = sqlx::query_as::<_, RoutePedido>(
            r#"
            SELECT * FROM route_pedidos
            WHERE route_id = $1 AND tenant_id = $2 AND pedido_id = $3 AND active = true
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(pedido_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attachment)
    }

    /// Vínculos activos de una ruta
    pub async fn find_by_route(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<RoutePedido>, AppError> {
        let attachments = sqlx::query_as::<_, RoutePedido>(
            r#"
            SELECT * FROM route_pedidos
            WHERE route_id = $1 AND tenant_id = $2 AND active = true
            ORDER BY created_at
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    /// Adjuntar un pedido: crea el vínculo y acumula cada línea como
    /// cantidad de entrega en el ledger de carga. Todo-o-nada.
    pub async fn attach(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        pedido_id: Uuid,
        lines: &[PedidoLine],
    ) -> Result<RoutePedido, AppError> {
        let mut tx = self.pool.begin().await?;

        let attachment = sqlx::query_as::<_, RoutePedido>(
            r#"
            INSERT INTO route_pedidos (id, route_id, tenant_id, pedido_id, status, active, created_at)
            VALUES ($1, $2, $3, $4, 'attached', true, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(route_id)
        .bind(tenant_id)
        .bind(pedido_id)
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            CargaRepository::add_delivery_tx(
                &mut tx,
                route_id,
                tenant_id,
                line.product_id,
                line.quantity,
                line.unit_price,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(attachment)
    }

    /// Desprender un pedido: desactiva el vínculo y revierte cada línea
    /// del ledger de carga con piso en cero. Todo-o-nada.
    pub async fn detach(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        pedido_id: Uuid,
        lines: &[PedidoLine],
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE route_pedidos
            SET active = false, status = 'detached'
            WHERE route_id = $1 AND tenant_id = $2 AND pedido_id = $3 AND active = true
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(pedido_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for line in lines {
            CargaRepository::subtract_delivery_tx(
                &mut tx,
                route_id,
                tenant_id,
                line.product_id,
                line.quantity,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
