//! DTOs de Cierre
//!
//! Requests y responses del inventario de retorno y el resumen de cierre.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clients::product_catalog::ProductInfo;
use crate::models::cierre::{BulkDestination, RetornoEntry};

/// Request para actualizar los buckets contados de una línea de retorno
///
/// Solo los campos presentes se actualizan; valores negativos se rechazan.
#[derive(Debug, Deserialize)]
pub struct UpdateRetornoRequest {
    pub qty_client_returns: Option<Decimal>,
    pub qty_mermas: Option<Decimal>,
    pub qty_warehouse: Option<Decimal>,
    pub qty_vehicle: Option<Decimal>,
}

/// Request de asignación masiva del remanente
#[derive(Debug, Deserialize)]
pub struct BulkAssignRequest {
    pub destination: BulkDestination,
}

/// Response de línea de retorno, enriquecida con catálogo
#[derive(Debug, Serialize)]
pub struct RetornoResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub qty_initial: Decimal,
    pub sales_amount: Decimal,
    pub qty_sold: Decimal,
    pub qty_delivered: Decimal,
    pub qty_client_returns: Decimal,
    pub qty_mermas: Decimal,
    pub qty_warehouse: Decimal,
    pub qty_vehicle: Decimal,
    pub difference: Decimal,
}

impl RetornoResponse {
    pub fn from_entry(entry: RetornoEntry, product: Option<&ProductInfo>) -> Self {
        Self {
            id: entry.id,
            route_id: entry.route_id,
            product_id: entry.product_id,
            product_name: product.map(|p| p.name.clone()),
            sku: product.and_then(|p| p.sku.clone()),
            qty_initial: entry.qty_initial,
            sales_amount: entry.sales_amount,
            qty_sold: entry.qty_sold,
            qty_delivered: entry.qty_delivered,
            qty_client_returns: entry.qty_client_returns,
            qty_mermas: entry.qty_mermas,
            qty_warehouse: entry.qty_warehouse,
            qty_vehicle: entry.qty_vehicle,
            difference: entry.difference,
        }
    }
}
