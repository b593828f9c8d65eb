//! Cliente del catálogo de productos
//!
//! Interfaz estrecha de solo lectura hacia las tablas del catálogo:
//! nombre, SKU, precio base y existencia actual por producto. Este
//! subsistema nunca escribe en ellas.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::errors::AppResult;

/// Datos de producto para enriquecer carga y retorno
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductInfo {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub base_price: Decimal,
    pub on_hand: Decimal,
}

pub struct ProductCatalogClient {
    pool: PgPool,
}

impl ProductCatalogClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Obtener productos por id, con su existencia actual
    pub async fn find_by_ids(
        &self,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> AppResult<Vec<ProductInfo>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, ProductInfo>(
            r#"
            SELECT p.id, p.name, p.sku, p.base_price,
                   COALESCE(s.on_hand, 0) AS on_hand
            FROM products p
            LEFT JOIN inventory_stock s
                ON s.product_id = p.id AND s.tenant_id = p.tenant_id
            WHERE p.tenant_id = $1 AND p.id = ANY($2)
            "#,
        )
        .bind(tenant_id)
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Verificar que un producto existe para el tenant
    pub async fn exists(&self, tenant_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
