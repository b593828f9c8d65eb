//! Modelo de Pedido adjunto
//!
//! Este módulo contiene el vínculo entre una ruta y un pedido confirmado
//! que se entregará durante la ruta, más las vistas de solo lectura que el
//! servicio de pedidos expone a este subsistema.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vínculo ruta-pedido - mapea exactamente a la tabla route_pedidos
///
/// A lo sumo un vínculo activo por par (route_id, pedido_id); el detach
/// desactiva la fila en lugar de borrarla.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutePedido {
    pub id: Uuid,
    pub route_id: Uuid,
    pub tenant_id: Uuid,
    pub pedido_id: Uuid,
    pub status: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Encabezado de pedido - vista de solo lectura del servicio de pedidos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PedidoHeader {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub pedido_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: String,
}

/// Línea de pedido - vista de solo lectura del servicio de pedidos
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PedidoLine {
    pub pedido_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}
