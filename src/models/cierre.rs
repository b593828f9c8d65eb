//! Modelo de Cierre
//!
//! Este módulo contiene el inventario de retorno (conciliación física por
//! producto al cerrar la ruta) y el resumen de cierre (conciliación de
//! efectivo esperado contra recibido).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Entrada de inventario de retorno - mapea a la tabla route_retornos
///
/// Invariante por fila:
/// difference = qty_initial - qty_sold - qty_delivered - qty_client_returns
///              - qty_mermas - qty_warehouse - qty_vehicle
///
/// Un cierre correcto lleva cada difference a 0, pero el motor solo expone
/// el número y las herramientas de asignación masiva; no lo fuerza.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RetornoEntry {
    pub id: Uuid,
    pub route_id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub qty_initial: Decimal,
    pub sales_amount: Decimal,
    pub qty_sold: Decimal,
    pub qty_delivered: Decimal,
    pub qty_client_returns: Decimal,
    pub qty_mermas: Decimal,
    pub qty_warehouse: Decimal,
    pub qty_vehicle: Decimal,
    pub difference: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RetornoEntry {
    /// Recalcular la diferencia según el invariante de la fila
    pub fn compute_difference(&self) -> Decimal {
        compute_difference(
            self.qty_initial,
            self.qty_sold,
            self.qty_delivered,
            self.qty_client_returns,
            self.qty_mermas,
            self.qty_warehouse,
            self.qty_vehicle,
        )
    }
}

/// Fórmula del invariante de retorno
pub fn compute_difference(
    initial: Decimal,
    sold: Decimal,
    delivered: Decimal,
    client_returns: Decimal,
    mermas: Decimal,
    warehouse: Decimal,
    vehicle: Decimal,
) -> Decimal {
    initial - sold - delivered - client_returns - mermas - warehouse - vehicle
}

/// Destino de la asignación masiva del remanente
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BulkDestination {
    Warehouse,
    Vehicle,
}

/// Totales categorizados del ledger de cobranza (colaborador externo).
///
/// La categorización de qué suma como "entrada de efectivo" la decide el
/// ledger de cobranza, no este subsistema; aquí solo se agregan los
/// buckets ya clasificados.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct CashTotals {
    pub cash_sales_total: Decimal,
    pub cash_sales_count: i64,
    pub credit_sales_total: Decimal,
    pub credit_sales_count: i64,
    pub collected_deliveries_total: Decimal,
    pub collected_deliveries_count: i64,
    pub credit_deliveries_total: Decimal,
    pub credit_deliveries_count: i64,
    pub collections_total: Decimal,
    pub collections_count: i64,
    pub presale_orders_total: Decimal,
    pub presale_orders_count: i64,
    pub returns_total: Decimal,
    pub returns_count: i64,
}

/// Resumen de cierre - derivado, no persistido por sí mismo
#[derive(Debug, Clone, Serialize)]
pub struct ClosingSummary {
    pub route_id: Uuid,
    pub totals: CashTotals,
    pub initial_cash: Decimal,
    pub expected: Decimal,
    pub cash_received: Option<Decimal>,
    pub difference: Option<Decimal>,
}

impl ClosingSummary {
    /// expected = ventas contado + entregas cobradas + cobranza + fondo inicial;
    /// difference = recibido - esperado, indefinida hasta capturar el recibido.
    pub fn build(
        route_id: Uuid,
        totals: CashTotals,
        initial_cash: Decimal,
        cash_received: Option<Decimal>,
    ) -> Self {
        let expected = totals.cash_sales_total
            + totals.collected_deliveries_total
            + totals.collections_total
            + initial_cash;
        let difference = cash_received.map(|received| received - expected);
        Self {
            route_id,
            totals,
            initial_cash,
            expected,
            cash_received,
            difference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(initial: i64) -> RetornoEntry {
        RetornoEntry {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            qty_initial: Decimal::from(initial),
            sales_amount: Decimal::ZERO,
            qty_sold: Decimal::ZERO,
            qty_delivered: Decimal::ZERO,
            qty_client_returns: Decimal::ZERO,
            qty_mermas: Decimal::ZERO,
            qty_warehouse: Decimal::ZERO,
            qty_vehicle: Decimal::ZERO,
            difference: Decimal::from(initial),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_difference_invariant() {
        let mut e = entry(20);
        e.qty_sold = Decimal::from(6);
        e.qty_delivered = Decimal::from(4);
        e.qty_client_returns = Decimal::from(1);
        e.qty_mermas = Decimal::from(2);
        e.qty_warehouse = Decimal::from(3);
        e.qty_vehicle = Decimal::from(1);

        // 20 - 6 - 4 - 1 - 2 - 3 - 1 = 3
        assert_eq!(e.compute_difference(), Decimal::from(3));
    }

    #[test]
    fn test_bulk_assign_zeroes_positive_difference() {
        let mut e = entry(10);
        e.qty_sold = Decimal::from(4);
        e.difference = e.compute_difference();
        assert_eq!(e.difference, Decimal::from(6));

        // Enviar todo el remanente al almacén
        e.qty_warehouse += e.difference;
        e.difference = e.compute_difference();
        assert_eq!(e.difference, Decimal::ZERO);
        assert_eq!(e.qty_warehouse, Decimal::from(6));
    }

    #[test]
    fn test_bulk_assign_skips_non_positive_difference() {
        let mut e = entry(5);
        e.qty_sold = Decimal::from(5);
        e.difference = e.compute_difference();
        assert_eq!(e.difference, Decimal::ZERO);

        // Líneas ya en cero (o negativas) no se tocan
        if e.difference > Decimal::ZERO {
            e.qty_vehicle += e.difference;
        }
        assert_eq!(e.qty_vehicle, Decimal::ZERO);
        assert_eq!(e.compute_difference(), Decimal::ZERO);
    }

    #[test]
    fn test_closing_summary_expected_and_difference() {
        let totals = CashTotals {
            cash_sales_total: Decimal::from(50),
            collected_deliveries_total: Decimal::from(25),
            collections_total: Decimal::from(10),
            credit_sales_total: Decimal::from(100),
            presale_orders_total: Decimal::from(40),
            returns_total: Decimal::from(7),
            ..Default::default()
        };

        // Los buckets a crédito / preventa / devoluciones no entran al esperado
        let summary =
            ClosingSummary::build(Uuid::new_v4(), totals.clone(), Decimal::from(5), None);
        assert_eq!(summary.expected, Decimal::from(90));
        assert_eq!(summary.difference, None);

        let summary = ClosingSummary::build(
            Uuid::new_v4(),
            totals,
            Decimal::from(5),
            Some(Decimal::from(100)),
        );
        assert_eq!(summary.expected, Decimal::from(90));
        assert_eq!(summary.difference, Some(Decimal::from(10)));
    }
}
