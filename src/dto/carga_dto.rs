//! DTOs de Carga
//!
//! Requests y responses del ledger de carga y del attach/detach de
//! pedidos a una ruta.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clients::product_catalog::ProductInfo;
use crate::models::carga::CargaEntry;
use crate::models::pedido::PedidoHeader;

/// Request para asignar o actualizar la cantidad de venta de un producto
#[derive(Debug, Deserialize)]
pub struct AssignCargaRequest {
    pub product_id: Uuid,
    pub qty_sale: Decimal,
    /// Un precio positivo reemplaza al guardado; ausente o cero lo conserva
    pub unit_price: Option<Decimal>,
}

/// Request para adjuntar un pedido a la ruta
#[derive(Debug, Deserialize)]
pub struct AttachPedidoRequest {
    pub pedido_id: Uuid,
}

/// Response de entrada de carga, enriquecida con catálogo e inventario
#[derive(Debug, Serialize)]
pub struct CargaResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub qty_delivery: Decimal,
    pub qty_sale: Decimal,
    pub qty_total: Decimal,
    pub unit_price: Decimal,
    pub on_hand: Option<Decimal>,
}

impl CargaResponse {
    pub fn from_entry(entry: CargaEntry, product: Option<&ProductInfo>) -> Self {
        Self {
            id: entry.id,
            route_id: entry.route_id,
            product_id: entry.product_id,
            product_name: product.map(|p| p.name.clone()),
            sku: product.and_then(|p| p.sku.clone()),
            qty_delivery: entry.qty_delivery,
            qty_sale: entry.qty_sale,
            qty_total: entry.qty_total,
            unit_price: entry.unit_price,
            on_hand: product.map(|p| p.on_hand),
        }
    }
}

/// Response de pedido disponible para adjuntar
#[derive(Debug, Serialize)]
pub struct AttachablePedidoResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub pedido_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: String,
}

impl From<PedidoHeader> for AttachablePedidoResponse {
    fn from(pedido: PedidoHeader) -> Self {
        Self {
            id: pedido.id,
            client_id: pedido.client_id,
            client_name: pedido.client_name,
            pedido_date: pedido.pedido_date,
            total_amount: pedido.total_amount,
            status: pedido.status,
        }
    }
}
