//! Modelo de Carga
//!
//! Este módulo contiene la entrada del ledger de carga: cantidades de un
//! producto asignadas a una ruta, separadas en entrega (pedidos) y venta
//! en ruta. El invariante qty_total = qty_delivery + qty_sale se mantiene
//! en cada mutación.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Entrada del ledger de carga - mapea exactamente a la tabla route_cargas
///
/// Una entrada con total cero se desactiva, nunca se borra: el historial
/// de lo que alguna vez subió al vehículo es parte de la auditoría.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CargaEntry {
    pub id: Uuid,
    pub route_id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub qty_delivery: Decimal,
    pub qty_sale: Decimal,
    pub qty_total: Decimal,
    pub unit_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Política de precio al asignar o fusionar carga.
///
/// Un precio explícito positivo siempre gana; un precio ausente o no
/// positivo conserva el precio ya guardado en la entrada en vez de
/// dejarlo en cero.
pub fn resolve_price(existing: Decimal, incoming: Option<Decimal>) -> Decimal {
    match incoming {
        Some(p) if p > Decimal::ZERO => p,
        _ => existing,
    }
}

/// Acumular cantidad de entrega (attach de pedido).
pub fn add_delivery(qty_delivery: Decimal, qty: Decimal) -> Decimal {
    qty_delivery + qty
}

/// Restar cantidad de entrega con piso en cero (detach de pedido).
pub fn subtract_delivery(qty_delivery: Decimal, qty: Decimal) -> Decimal {
    let result = qty_delivery - qty;
    if result < Decimal::ZERO {
        Decimal::ZERO
    } else {
        result
    }
}

/// Total recalculado tras cualquier mutación
pub fn total(qty_delivery: Decimal, qty_sale: Decimal) -> Decimal {
    qty_delivery + qty_sale
}

/// Una entrada sigue activa mientras le quede cantidad total
pub fn is_active(qty_total: Decimal) -> bool {
    qty_total > Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_invariant() {
        let delivery = Decimal::from(5);
        let sale = Decimal::from(3);
        assert_eq!(total(delivery, sale), Decimal::from(8));

        let delivery = add_delivery(delivery, Decimal::from(2));
        assert_eq!(total(delivery, sale), Decimal::from(10));

        let delivery = subtract_delivery(delivery, Decimal::from(7));
        assert_eq!(delivery, Decimal::ZERO);
        assert_eq!(total(delivery, sale), sale);
    }

    #[test]
    fn test_price_explicit_positive_wins() {
        let existing = Decimal::from(20);
        assert_eq!(resolve_price(existing, Some(Decimal::from(25))), Decimal::from(25));
    }

    #[test]
    fn test_price_absent_or_zero_keeps_existing() {
        let existing = Decimal::from(20);
        assert_eq!(resolve_price(existing, None), existing);
        assert_eq!(resolve_price(existing, Some(Decimal::ZERO)), existing);
        assert_eq!(resolve_price(existing, Some(Decimal::from(-3))), existing);
    }

    #[test]
    fn test_subtract_floors_at_zero() {
        assert_eq!(
            subtract_delivery(Decimal::from(5), Decimal::from(8)),
            Decimal::ZERO
        );
        assert_eq!(
            subtract_delivery(Decimal::from(8), Decimal::from(5)),
            Decimal::from(3)
        );
    }

    #[test]
    fn test_entry_deactivates_at_zero_total() {
        assert!(is_active(Decimal::from(1)));
        assert!(!is_active(Decimal::ZERO));
        assert!(!is_active(Decimal::from(-1)));
    }

    #[test]
    fn test_attach_detach_round_trip() {
        // attach de un pedido con qty 5 y luego detach del mismo pedido
        // regresa el ledger exactamente a su estado previo
        let before_delivery = Decimal::from(2);
        let sale = Decimal::from(4);

        let after_attach = add_delivery(before_delivery, Decimal::from(5));
        assert_eq!(total(after_attach, sale), Decimal::from(11));

        let after_detach = subtract_delivery(after_attach, Decimal::from(5));
        assert_eq!(after_detach, before_delivery);
        assert_eq!(total(after_detach, sale), total(before_delivery, sale));
    }
}
