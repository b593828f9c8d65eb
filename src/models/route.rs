//! Modelo de Ruta
//!
//! Este módulo contiene el struct Route, el enum de estados y las reglas
//! de transición del ciclo de vida de una ruta de venta en campo.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la ruta - mapea al ENUM route_status
///
/// El grafo de transiciones es monótono: una ruta nunca regresa a un
/// estado anterior, y Closed / Cancelled son terminales.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    AwaitingAcceptance,
    LoadAccepted,
    InProgress,
    Completed,
    Closed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Planned => "planned",
            RouteStatus::AwaitingAcceptance => "awaiting_acceptance",
            RouteStatus::LoadAccepted => "load_accepted",
            RouteStatus::InProgress => "in_progress",
            RouteStatus::Completed => "completed",
            RouteStatus::Closed => "closed",
            RouteStatus::Cancelled => "cancelled",
        }
    }

    /// despachar carga: Planned -> AwaitingAcceptance
    pub fn can_dispatch(&self) -> bool {
        matches!(self, RouteStatus::Planned)
    }

    /// aceptar carga: AwaitingAcceptance -> LoadAccepted
    pub fn can_accept_load(&self) -> bool {
        matches!(self, RouteStatus::AwaitingAcceptance)
    }

    /// iniciar ruta: {Planned, LoadAccepted} -> InProgress
    pub fn can_start(&self) -> bool {
        matches!(self, RouteStatus::Planned | RouteStatus::LoadAccepted)
    }

    /// completar ruta: InProgress -> Completed
    pub fn can_complete(&self) -> bool {
        matches!(self, RouteStatus::InProgress)
    }

    /// cerrar ruta: Completed -> Closed
    pub fn can_close(&self) -> bool {
        matches!(self, RouteStatus::Completed)
    }

    /// cancelar ruta: {Planned, InProgress} -> Cancelled
    pub fn can_cancel(&self) -> bool {
        matches!(self, RouteStatus::Planned | RouteStatus::InProgress)
    }

    /// La planificación (stops y carga) solo se edita en Planned
    pub fn allows_planning_edits(&self) -> bool {
        matches!(self, RouteStatus::Planned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Closed | RouteStatus::Cancelled)
    }
}

/// Ruta principal - mapea exactamente a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub salesperson_id: Uuid,
    pub salesperson_name: String,
    pub zone_id: Option<Uuid>,
    pub name: String,
    pub route_date: NaiveDate,
    pub estimated_start: Option<DateTime<Utc>>,
    pub estimated_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: RouteStatus,
    pub estimated_distance_km: Option<Decimal>,
    pub actual_distance_km: Option<Decimal>,
    pub notes: Option<String>,
    pub initial_cash: Decimal,
    pub load_comments: Option<String>,
    pub cash_received: Option<Decimal>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Concatenar una nota nueva sin pisar las existentes.
///
/// Cancelaciones y salidas de parada agregan texto; el historial previo
/// nunca se sobreescribe.
pub fn append_notes(existing: Option<&str>, addition: &str) -> String {
    match existing {
        Some(prev) if !prev.trim().is_empty() => format!("{}\n{}", prev, addition),
        _ => addition.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RouteStatus; 7] = [
        RouteStatus::Planned,
        RouteStatus::AwaitingAcceptance,
        RouteStatus::LoadAccepted,
        RouteStatus::InProgress,
        RouteStatus::Completed,
        RouteStatus::Closed,
        RouteStatus::Cancelled,
    ];

    #[test]
    fn test_dispatch_only_from_planned() {
        for status in ALL {
            assert_eq!(status.can_dispatch(), status == RouteStatus::Planned);
        }
    }

    #[test]
    fn test_start_from_planned_or_load_accepted() {
        assert!(RouteStatus::Planned.can_start());
        assert!(RouteStatus::LoadAccepted.can_start());
        assert!(!RouteStatus::AwaitingAcceptance.can_start());
        assert!(!RouteStatus::InProgress.can_start());
        assert!(!RouteStatus::Completed.can_start());
        assert!(!RouteStatus::Closed.can_start());
        assert!(!RouteStatus::Cancelled.can_start());
    }

    #[test]
    fn test_complete_only_from_in_progress() {
        for status in ALL {
            assert_eq!(status.can_complete(), status == RouteStatus::InProgress);
        }
    }

    #[test]
    fn test_close_only_from_completed() {
        for status in ALL {
            assert_eq!(status.can_close(), status == RouteStatus::Completed);
        }
    }

    #[test]
    fn test_cancel_from_planned_or_in_progress() {
        for status in ALL {
            assert_eq!(
                status.can_cancel(),
                status == RouteStatus::Planned || status == RouteStatus::InProgress
            );
        }
    }

    #[test]
    fn test_terminal_states_allow_nothing() {
        for status in [RouteStatus::Closed, RouteStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(!status.can_dispatch());
            assert!(!status.can_accept_load());
            assert!(!status.can_start());
            assert!(!status.can_complete());
            assert!(!status.can_close());
            assert!(!status.can_cancel());
            assert!(!status.allows_planning_edits());
        }
    }

    #[test]
    fn test_append_notes_preserves_history() {
        assert_eq!(append_notes(None, "cancelada por lluvia"), "cancelada por lluvia");
        assert_eq!(append_notes(Some(""), "motivo"), "motivo");
        assert_eq!(
            append_notes(Some("nota previa"), "cancelada por lluvia"),
            "nota previa\ncancelada por lluvia"
        );
    }
}
