//! Modelo de Parada
//!
//! Este módulo contiene el struct Stop, el enum de estados de visita y la
//! lógica pura de reordenamiento del itinerario (ranking denso 1..N).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de una parada - mapea al ENUM stop_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "stop_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    EnRoute,
    Visited,
    Skipped,
}

impl StopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopStatus::Pending => "pending",
            StopStatus::EnRoute => "en_route",
            StopStatus::Visited => "visited",
            StopStatus::Skipped => "skipped",
        }
    }

    /// llegada: {Pending, EnRoute} -> Visited
    pub fn can_arrive(&self) -> bool {
        matches!(self, StopStatus::Pending | StopStatus::EnRoute)
    }

    /// saltar: {Pending, EnRoute} -> Skipped
    pub fn can_skip(&self) -> bool {
        matches!(self, StopStatus::Pending | StopStatus::EnRoute)
    }
}

/// Parada de ruta - mapea exactamente a la tabla route_stops
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stop {
    pub id: Uuid,
    pub route_id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub visit_order: i32,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub estimated_duration_min: Option<i32>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub status: StopStatus,
    pub visit_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub skip_reason: Option<String>,
    pub distance_from_prev_km: Option<Decimal>,
    pub arrival_lat: Option<f64>,
    pub arrival_lng: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Calcular los nuevos visit_order para un reordenamiento completo.
///
/// `requested` es la permutación enviada por el operador (ids en el orden
/// deseado) y `current` son los ids activos de la ruta. La asignación es
/// todo-o-nada: si la permutación no cubre exactamente el conjunto actual
/// se rechaza, porque una aplicación parcial dejaría rankings duplicados.
pub fn compute_reorder(
    current: &[Uuid],
    requested: &[Uuid],
) -> Result<Vec<(Uuid, i32)>, ReorderError> {
    if requested.len() != current.len() {
        return Err(ReorderError::WrongLength {
            expected: current.len(),
            got: requested.len(),
        });
    }

    let mut seen = std::collections::HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(ReorderError::Duplicate(*id));
        }
        if !current.contains(id) {
            return Err(ReorderError::UnknownStop(*id));
        }
    }

    Ok(requested
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx as i32 + 1))
        .collect())
}

/// Errores del cálculo de reordenamiento
#[derive(Debug, PartialEq, Eq)]
pub enum ReorderError {
    WrongLength { expected: usize, got: usize },
    Duplicate(Uuid),
    UnknownStop(Uuid),
}

impl std::fmt::Display for ReorderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReorderError::WrongLength { expected, got } => write!(
                f,
                "reorder must cover all {} active stops, got {}",
                expected, got
            ),
            ReorderError::Duplicate(id) => write!(f, "stop '{}' appears twice", id),
            ReorderError::UnknownStop(id) => {
                write!(f, "stop '{}' does not belong to this route", id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_reorder_assigns_dense_ranks() {
        let current = ids(4);
        let requested = vec![current[2], current[0], current[3], current[1]];

        let ranks = compute_reorder(&current, &requested).unwrap();
        assert_eq!(ranks.len(), 4);
        for (idx, (id, rank)) in ranks.iter().enumerate() {
            assert_eq!(*id, requested[idx]);
            assert_eq!(*rank, idx as i32 + 1);
        }

        // Sin huecos ni duplicados
        let mut seen: Vec<i32> = ranks.iter().map(|(_, r)| *r).collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_move_stop_up_twice() {
        // [A, B, C]; subir C dos posiciones -> [C, A, B]
        let current = ids(3);
        let (a, b, c) = (current[0], current[1], current[2]);

        let paso1 = vec![a, c, b];
        let ranks = compute_reorder(&current, &paso1).unwrap();
        assert_eq!(ranks, vec![(a, 1), (c, 2), (b, 3)]);

        let paso2 = vec![c, a, b];
        let ranks = compute_reorder(&current, &paso2).unwrap();
        assert_eq!(ranks, vec![(c, 1), (a, 2), (b, 3)]);
    }

    #[test]
    fn test_reorder_rejects_partial_permutation() {
        let current = ids(3);
        let requested = vec![current[0], current[1]];
        assert!(matches!(
            compute_reorder(&current, &requested),
            Err(ReorderError::WrongLength { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_reorder_rejects_duplicates() {
        let current = ids(3);
        let requested = vec![current[0], current[0], current[1]];
        assert_eq!(
            compute_reorder(&current, &requested),
            Err(ReorderError::Duplicate(current[0]))
        );
    }

    #[test]
    fn test_reorder_rejects_foreign_stop() {
        let current = ids(2);
        let outsider = Uuid::new_v4();
        let requested = vec![current[0], outsider];
        assert_eq!(
            compute_reorder(&current, &requested),
            Err(ReorderError::UnknownStop(outsider))
        );
    }

    #[test]
    fn test_arrive_and_skip_guards() {
        assert!(StopStatus::Pending.can_arrive());
        assert!(StopStatus::EnRoute.can_arrive());
        assert!(!StopStatus::Visited.can_arrive());
        assert!(!StopStatus::Skipped.can_arrive());

        assert!(StopStatus::Pending.can_skip());
        assert!(StopStatus::EnRoute.can_skip());
        assert!(!StopStatus::Visited.can_skip());
        assert!(!StopStatus::Skipped.can_skip());
    }
}
