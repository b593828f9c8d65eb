//! Repositorio de Carga
//!
//! Acceso a datos del ledger de carga. El upsert de venta fusiona sobre
//! la entrada activa del par (ruta, producto); quitar un producto
//! desactiva la entrada en lugar de ponerla en cero, para que una
//! asignación vieja no resucite en las consultas enriquecidas.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::carga::{self, CargaEntry};
use crate::utils::errors::AppError;

pub struct CargaRepository {
    pool: PgPool,
}

impl CargaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entradas activas de la ruta, en orden de producto
    pub async fn find_active_by_route(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<CargaEntry>, AppError> {
        let entries = sqlx::query_as::<_, CargaEntry>(
            r#"
            SELECT * FROM route_cargas
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
            "SELECT COUNT(*) FROM route_cargas
             WHERE route_id = $1 AND tenant_id = $2 AND active = true",
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Asignar o actualizar la cantidad de venta de un producto.
    ///
    /// Fusiona sobre la entrada activa existente del par (ruta, producto)
    /// o crea una nueva; el total se recalcula siempre. Si el total queda
    /// en cero la entrada se desactiva en la misma sentencia, y la fila
    /// devuelta ya refleja ese estado.
    pub async fn upsert_sale(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        product_id: Uuid,
        qty_sale: Decimal,
        unit_price: Option<Decimal>,
    ) -> Result<CargaEntry, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, CargaEntry>(
            r#"
            SELECT * FROM route_cargas
            WHERE route_id = $1 AND tenant_id = $2 AND product_id = $3 AND active = true
            FOR UPDATE
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = match existing {
            Some(current) => {
                let price = carga::resolve_price(current.unit_price, unit_price);
                let total = carga::total(current.qty_delivery, qty_sale);

                sqlx::query_as::<_, CargaEntry>(
                    r#"
                    UPDATE route_cargas
                    SET qty_sale = $2, qty_total = $3, unit_price = $4, active = $5,
                        updated_at = now()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(current.id)
                .bind(qty_sale)
                .bind(total)
                .bind(price)
                .bind(carga::is_active(total))
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                let price = carga::resolve_price(Decimal::ZERO, unit_price);

                sqlx::query_as::<_, CargaEntry>(
                    r#"
                    INSERT INTO route_cargas (
                        id, route_id, tenant_id, product_id, qty_delivery, qty_sale,
                        qty_total, unit_price, active, created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, 0, $5, $5, $6, $7, now(), now())
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(route_id)
                .bind(tenant_id)
                .bind(product_id)
                .bind(qty_sale)
                .bind(price)
                .bind(carga::is_active(qty_sale))
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(entry)
    }

    /// Quitar un producto de la carga: desactiva la entrada
    pub async fn deactivate(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE route_cargas
            SET active = false, updated_at = now()
            WHERE route_id = $1 AND tenant_id = $2 AND product_id = $3 AND active = true
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Acumular cantidad de entrega dentro de la transacción de un attach.
    ///
    /// El precio del pedido solo se adopta cuando la entrada es nueva (sin
    /// precio previo); una entrada existente conserva el suyo.
    pub async fn add_delivery_tx(
        tx: &mut Transaction<'_, Postgres>,
        route_id: Uuid,
        tenant_id: Uuid,
        product_id: Uuid,
        qty: Decimal,
        line_price: Decimal,
    ) -> Result<CargaEntry, AppError> {
        let existing = sqlx::query_as::<_, CargaEntry>(
            r#"
            SELECT * FROM route_cargas
            WHERE route_id = $1 AND tenant_id = $2 AND product_id = $3 AND active = true
            FOR UPDATE
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        let entry = match existing {
            Some(current) => {
                let delivery = carga::add_delivery(current.qty_delivery, qty);
                let total = carga::total(delivery, current.qty_sale);

                sqlx::query_as::<_, CargaEntry>(
                    r#"
                    UPDATE route_cargas
                    SET qty_delivery = $2, qty_total = $3, updated_at = now()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(current.id)
                .bind(delivery)
                .bind(total)
                .fetch_one(&mut **tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, CargaEntry>(
                    r#"
                    INSERT INTO route_cargas (
                        id, route_id, tenant_id, product_id, qty_delivery, qty_sale,
                        qty_total, unit_price, active, created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, 0, $5, $6, true, now(), now())
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(route_id)
                .bind(tenant_id)
                .bind(product_id)
                .bind(qty)
                .bind(line_price)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        Ok(entry)
    }

    /// Restar cantidad de entrega dentro de la transacción de un detach.
    ///
    /// Piso en cero; una entrada cuyo total llega a cero se desactiva por
    /// completo para que el round trip attach/detach sea exacto.
    pub async fn subtract_delivery_tx(
        tx: &mut Transaction<'_, Postgres>,
        route_id: Uuid,
        tenant_id: Uuid,
        product_id: Uuid,
        qty: Decimal,
    ) -> Result<(), AppError> {
        let existing = sqlx::query_as::<_, CargaEntry>(
            r#"
            SELECT * FROM route_cargas
            WHERE route_id = $1 AND tenant_id = $2 AND product_id = $3 AND active = true
            FOR UPDATE
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(current) = existing else {
            // El producto ya no está en la carga; nada que revertir
            return Ok(());
        };

        let delivery = carga::subtract_delivery(current.qty_delivery, qty);
        let total = carga::total(delivery, current.qty_sale);
        let still_active = carga::is_active(total);

        sqlx::query(
            r#"
            UPDATE route_cargas
            SET qty_delivery = $2, qty_total = $3, active = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(current.id)
        .bind(delivery)
        .bind(total)
        .bind(still_active)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
