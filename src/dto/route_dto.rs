//! DTOs de Ruta
//!
//! Requests, responses y filtros para el store de rutas y las
//! transiciones de su ciclo de vida.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::stop_dto::StopResponse;
use crate::models::route::{Route, RouteStatus};

/// Request para crear una nueva ruta
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRouteRequest {
    pub salesperson_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub salesperson_name: String,

    pub zone_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub route_date: NaiveDate,

    pub estimated_start: Option<DateTime<Utc>>,
    pub estimated_end: Option<DateTime<Utc>>,
    pub estimated_distance_km: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    pub initial_cash: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub load_comments: Option<String>,
}

/// Request para actualizar una ruta existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRouteRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub route_date: Option<NaiveDate>,
    pub zone_id: Option<Uuid>,
    pub estimated_start: Option<DateTime<Utc>>,
    pub estimated_end: Option<DateTime<Utc>>,
    pub estimated_distance_km: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    pub initial_cash: Option<Decimal>,

    #[validate(length(max = 2000))]
    pub load_comments: Option<String>,
}

/// Filtros para búsqueda de rutas
#[derive(Debug, Default, Deserialize)]
pub struct RouteFilters {
    pub salesperson_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub status: Option<RouteStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request para activar/desactivar rutas en lote
#[derive(Debug, Deserialize, Validate)]
pub struct BatchActiveRequest {
    #[validate(length(min = 1))]
    pub route_ids: Vec<Uuid>,
    pub active: bool,
}

/// Request para completar una ruta
#[derive(Debug, Deserialize)]
pub struct CompleteRouteRequest {
    pub actual_distance_km: Option<Decimal>,
}

/// Request para cancelar una ruta
#[derive(Debug, Deserialize, Validate)]
pub struct CancelRouteRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Request para cerrar una ruta
#[derive(Debug, Deserialize)]
pub struct CloseRouteRequest {
    pub cash_received: Decimal,
}

/// Response de ruta para la API
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteResponse {
    pub id: Uuid,
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
}

impl From<Route> for RouteResponse {
    fn from(route: Route) -> Self {
        Self {
            id: route.id,
            salesperson_id: route.salesperson_id,
            salesperson_name: route.salesperson_name,
            zone_id: route.zone_id,
            name: route.name,
            route_date: route.route_date,
            estimated_start: route.estimated_start,
            estimated_end: route.estimated_end,
            actual_start: route.actual_start,
            actual_end: route.actual_end,
            status: route.status,
            estimated_distance_km: route.estimated_distance_km,
            actual_distance_km: route.actual_distance_km,
            notes: route.notes,
            initial_cash: route.initial_cash,
            load_comments: route.load_comments,
            cash_received: route.cash_received,
            closed_at: route.closed_at,
            closed_by: route.closed_by,
            active: route.active,
            created_at: route.created_at,
        }
    }
}

/// Response de ruta con su itinerario
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDetailResponse {
    #[serde(flatten)]
    pub route: RouteResponse,
    pub stops: Vec<StopResponse>,
}

/// Response de listado paginado
#[derive(Debug, Serialize)]
pub struct RouteListResponse {
    pub routes: Vec<RouteResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
