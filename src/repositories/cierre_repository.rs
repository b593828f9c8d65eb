//! Repositorio de Cierre
//!
//! Acceso a datos del inventario de retorno. La materialización es un
//! "ensure" idempotente respaldado por el índice único parcial
//! (route_id, product_id) WHERE active; las actualizaciones por línea
//! recalculan la diferencia en el mismo UPDATE, así los escritores
//! concurrentes sobre la misma línea quedan en last-write-wins por fila.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::clients::cash_ledger::ProductMovement;
use crate::models::carga::CargaEntry;
use crate::models::cierre::{BulkDestination, RetornoEntry};
use crate::utils::errors::AppError;

pub struct CierreRepository {
    pool: PgPool,
}

impl CierreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Materializar las líneas de retorno desde el snapshot de carga.
    ///
    /// Idempotente: llamadas posteriores no re-crean nada gracias al
    /// índice único parcial. La siembra parte de qty_total de cada
    /// entrada activa de carga, con lo vendido/entregado que ya registró
    /// el ledger de cobranza.
    pub async fn ensure_initialized(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        cargas: &[CargaEntry],
        movements: &[ProductMovement],
    ) -> Result<(), AppError> {
        if cargas.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for carga in cargas {
            let movement = movements.iter().find(|m| m.product_id == carga.product_id);
            let qty_sold = movement.map(|m| m.qty_sold).unwrap_or(Decimal::ZERO);
            let qty_delivered = movement.map(|m| m.qty_delivered).unwrap_or(Decimal::ZERO);
            let sales_amount = movement.map(|m| m.sales_amount).unwrap_or(Decimal::ZERO);
            let difference = carga.qty_total - qty_sold - qty_delivered;

            sqlx::query(
                r#"
                INSERT INTO route_retornos (
                    id, route_id, tenant_id, product_id, qty_initial, sales_amount,
                    qty_sold, qty_delivered, qty_client_returns, qty_mermas,
                    qty_warehouse, qty_vehicle, difference, active, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, 0, 0, $9, true, now(), now())
                ON CONFLICT (route_id, product_id) WHERE active DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(route_id)
            .bind(tenant_id)
            .bind(carga.product_id)
            .bind(carga.qty_total)
            .bind(sales_amount)
            .bind(qty_sold)
            .bind(qty_delivered)
            .bind(difference)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Líneas de retorno activas de la ruta
    pub async fn find_active_by_route(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<RetornoEntry>, AppError> {
        let entries = sqlx::query_as::<_, RetornoEntry>(
            r#"
            SELECT * FROM route_retornos
            WHERE route_id = $1 AND tenant_id = $2 AND active = true
            ORDER BY created_at
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn count_active(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM route_retornos
             WHERE route_id = $1 AND tenant_id = $2 AND active = true",
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Actualizar los buckets contados de una línea.
    ///
    /// La diferencia se recalcula en el mismo UPDATE a partir de las
    /// columnas de la propia fila, conservando el invariante sin importar
    /// qué escritor llegó último.
    pub async fn update_line(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        product_id: Uuid,
        qty_client_returns: Option<Decimal>,
        qty_mermas: Option<Decimal>,
        qty_warehouse: Option<Decimal>,
        qty_vehicle: Option<Decimal>,
    ) -> Result<Option<RetornoEntry>, AppError> {
        let entry = sqlx::query_as::<_, RetornoEntry>(
            r#"
            UPDATE route_retornos
            SET qty_client_returns = COALESCE($4, qty_client_returns),
                qty_mermas = COALESCE($5, qty_mermas),
                qty_warehouse = COALESCE($6, qty_warehouse),
                qty_vehicle = COALESCE($7, qty_vehicle),
                difference = qty_initial - qty_sold - qty_delivered
                    - COALESCE($4, qty_client_returns)
                    - COALESCE($5, qty_mermas)
                    - COALESCE($6, qty_warehouse)
                    - COALESCE($7, qty_vehicle),
                updated_at = now()
            WHERE route_id = $1 AND tenant_id = $2 AND product_id = $3 AND active = true
            RETURNING *
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(product_id)
        .bind(qty_client_returns)
        .bind(qty_mermas)
        .bind(qty_warehouse)
        .bind(qty_vehicle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Enviar todo el remanente positivo al destino elegido.
    ///
    /// Un solo UPDATE: cada línea con diferencia > 0 suma su diferencia
    /// al bucket y queda en cero; las demás no se tocan.
    pub async fn bulk_assign(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        destination: BulkDestination,
    ) -> Result<u64, AppError> {
        let sql = match destination {
            BulkDestination::Warehouse => {
                r#"
                UPDATE route_retornos
                SET qty_warehouse = qty_warehouse + difference,
                    difference = 0, updated_at = now()
                WHERE route_id = $1 AND tenant_id = $2 AND active = true AND difference > 0
                "#
            }
            BulkDestination::Vehicle => {
                r#"
                UPDATE route_retornos
                SET qty_vehicle = qty_vehicle + difference,
                    difference = 0, updated_at = now()
                WHERE route_id = $1 AND tenant_id = $2 AND active = true AND difference > 0
                "#
            }
        };

        let result = sqlx::query(sql)
            .bind(route_id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
