//! Cliente del ledger de cobranza
//!
//! Interfaz estrecha de solo lectura hacia los movimientos de efectivo de
//! una ruta. La categorización de cada movimiento (venta contado, venta a
//! crédito, entrega cobrada, cobranza, preventa, devolución) la decide el
//! ledger; aquí solo se agregan los buckets ya clasificados.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::cierre::CashTotals;
use crate::utils::errors::AppResult;

/// Movimiento agregado por producto, para sembrar el retorno
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductMovement {
    pub product_id: Uuid,
    pub qty_sold: Decimal,
    pub qty_delivered: Decimal,
    pub sales_amount: Decimal,
}

pub struct CashLedgerClient {
    pool: PgPool,
}

impl CashLedgerClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Totales categorizados de la ruta para el resumen de cierre
    pub async fn route_totals(
        &self,
        tenant_id: Uuid,
        route_id: Uuid,
    ) -> AppResult<CashTotals> {
        let totals = sqlx::query_as::<_, CashTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE category = 'cash_sale'), 0)           AS cash_sales_total,
                COUNT(*) FILTER (WHERE category = 'cash_sale')                           AS cash_sales_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'credit_sale'), 0)         AS credit_sales_total,
                COUNT(*) FILTER (WHERE category = 'credit_sale')                         AS credit_sales_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'collected_delivery'), 0)  AS collected_deliveries_total,
                COUNT(*) FILTER (WHERE category = 'collected_delivery')                  AS collected_deliveries_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'credit_delivery'), 0)     AS credit_deliveries_total,
                COUNT(*) FILTER (WHERE category = 'credit_delivery')                     AS credit_deliveries_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'collection'), 0)          AS collections_total,
                COUNT(*) FILTER (WHERE category = 'collection')                          AS collections_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'presale_order'), 0)       AS presale_orders_total,
                COUNT(*) FILTER (WHERE category = 'presale_order')                       AS presale_orders_count,
                COALESCE(SUM(amount) FILTER (WHERE category = 'return'), 0)              AS returns_total,
                COUNT(*) FILTER (WHERE category = 'return')                              AS returns_count
            FROM cash_movements
            WHERE tenant_id = $1 AND route_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(route_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Cantidades vendidas/entregadas por producto durante la ruta,
    /// para sembrar las líneas de retorno
    pub async fn route_product_movements(
        &self,
        tenant_id: Uuid,
        route_id: Uuid,
    ) -> AppResult<Vec<ProductMovement>> {
        let movements = sqlx::query_as::<_, ProductMovement>(
            r#"
            SELECT
                product_id,
                COALESCE(SUM(quantity) FILTER (WHERE kind = 'sale'), 0)     AS qty_sold,
                COALESCE(SUM(quantity) FILTER (WHERE kind = 'delivery'), 0) AS qty_delivered,
                COALESCE(SUM(amount) FILTER (WHERE kind = 'sale'), 0)       AS sales_amount
            FROM cash_movement_lines
            WHERE tenant_id = $1 AND route_id = $2
            GROUP BY product_id
            "#,
        )
        .bind(tenant_id)
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
