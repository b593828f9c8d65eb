//! DTOs de Parada
//!
//! Requests y responses para el itinerario de una ruta.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::clients::client_directory::ClientInfo;
use crate::models::stop::{Stop, StopStatus};

/// Request para agregar una parada al itinerario
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStopRequest {
    pub client_id: Uuid,
    pub estimated_arrival: Option<DateTime<Utc>>,

    #[validate(range(min = 0))]
    pub estimated_duration_min: Option<i32>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    pub distance_from_prev_km: Option<Decimal>,
}

/// Request para reordenar el itinerario completo
///
/// Debe incluir todos los stop_ids activos de la ruta, en el orden deseado.
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderStopsRequest {
    #[validate(length(min = 1))]
    pub stop_ids: Vec<Uuid>,
}

/// Request de llegada a una parada
#[derive(Debug, Deserialize)]
pub struct ArriveStopRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Request de salida de una parada
#[derive(Debug, Deserialize, Validate)]
pub struct DepartStopRequest {
    pub visit_id: Option<Uuid>,
    pub order_id: Option<Uuid>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Request para saltar una parada
#[derive(Debug, Deserialize, Validate)]
pub struct SkipStopRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Response de parada, enriquecida con los datos del cliente
#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub client_id: Uuid,
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub client_lat: Option<f64>,
    pub client_lng: Option<f64>,
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
}

impl StopResponse {
    pub fn from_stop(stop: Stop, client: Option<&ClientInfo>) -> Self {
        Self {
            id: stop.id,
            route_id: stop.route_id,
            client_id: stop.client_id,
            client_name: client.map(|c| c.name.clone()),
            client_address: client.and_then(|c| c.address.clone()),
            client_lat: client.and_then(|c| c.lat),
            client_lng: client.and_then(|c| c.lng),
            visit_order: stop.visit_order,
            estimated_arrival: stop.estimated_arrival,
            estimated_duration_min: stop.estimated_duration_min,
            actual_arrival: stop.actual_arrival,
            actual_departure: stop.actual_departure,
            status: stop.status,
            visit_id: stop.visit_id,
            order_id: stop.order_id,
            notes: stop.notes,
            skip_reason: stop.skip_reason,
            distance_from_prev_km: stop.distance_from_prev_km,
            arrival_lat: stop.arrival_lat,
            arrival_lng: stop.arrival_lng,
        }
    }
}
