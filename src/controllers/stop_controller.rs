//! Controller de Paradas
//!
//! Reglas de negocio del itinerario. Las ediciones estructurales (alta,
//! baja, reordenamiento) solo se permiten con la ruta en Planned; las
//! transiciones de visita solo con la ruta en progreso.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::cache::RouteCache;
use crate::clients::client_directory::ClientDirectoryClient;
use crate::dto::common::ApiResponse;
use crate::dto::stop_dto::{
    ArriveStopRequest, CreateStopRequest, DepartStopRequest, ReorderStopsRequest,
    SkipStopRequest, StopResponse,
};
use crate::middleware::AuthenticatedUser;
use crate::models::route::{Route, RouteStatus};
use crate::models::stop::{self, Stop};
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::stop_repository::StopRepository;
use crate::utils::errors::{invalid_transition_error, not_found_error, AppError};
use crate::utils::validation::{validate_coordinates, validate_not_empty};

pub struct StopController {
    repository: StopRepository,
    routes: RouteRepository,
    clients: ClientDirectoryClient,
    cache: RouteCache,
}

impl StopController {
    pub fn new(pool: sqlx::PgPool, cache: RouteCache) -> Self {
        Self {
            repository: StopRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            clients: ClientDirectoryClient::new(pool),
            cache,
        }
    }

    pub async fn list(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Vec<StopResponse>, AppError> {
        self.require_route(route_id, user).await?;

        let stops = self.repository.find_by_route(route_id, user.tenant_id).await?;
        self.enrich(stops, user).await
    }

    /// Agregar una parada; la ruta debe seguir en planeación
    pub async fn create(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
        request: CreateStopRequest,
    ) -> Result<ApiResponse<StopResponse>, AppError> {
        request.validate()?;

        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "add a stop to")?;

        if !self.clients.exists(user.tenant_id, request.client_id).await? {
            return Err(not_found_error("Client", &request.client_id.to_string()));
        }

        let stop = self
            .repository
            .create(route_id, user.tenant_id, request)
            .await?;

        self.invalidate_cache(&route).await;
        info!("📍 Parada agregada a ruta {}: orden {}", route_id, stop.visit_order);

        Ok(ApiResponse::success_with_message(
            StopResponse::from_stop(stop, None),
            "Parada agregada exitosamente".to_string(),
        ))
    }

    /// Quitar una parada; las sobrevivientes se renumeran densas
    pub async fn remove(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<(), AppError> {
        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "remove a stop from")?;

        if !self
            .repository
            .remove(stop_id, route_id, user.tenant_id)
            .await?
        {
            return Err(not_found_error("Stop", &stop_id.to_string()));
        }

        self.invalidate_cache(&route).await;
        info!("🗑️ Parada {} quitada de ruta {}", stop_id, route_id);
        Ok(())
    }

    /// Reordenar el itinerario completo con una permutación de stop_ids
    pub async fn reorder(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
        request: ReorderStopsRequest,
    ) -> Result<Vec<StopResponse>, AppError> {
        request.validate()?;

        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "reorder")?;

        let current: Vec<Uuid> = self
            .repository
            .find_by_route(route_id, user.tenant_id)
            .await?
            .iter()
            .map(|s| s.id)
            .collect();

        let ranks = stop::compute_reorder(&current, &request.stop_ids)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        self.repository
            .reorder(route_id, user.tenant_id, &ranks)
            .await?;

        self.invalidate_cache(&route).await;
        info!("🔀 Itinerario de ruta {} reordenado", route_id);

        let stops = self.repository.find_by_route(route_id, user.tenant_id).await?;
        self.enrich(stops, user).await
    }

    /// llegada a la parada, con las coordenadas reportadas por el dispositivo
    pub async fn arrive(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        user: &AuthenticatedUser,
        request: ArriveStopRequest,
    ) -> Result<StopResponse, AppError> {
        validate_coordinates(request.lat, request.lng)
            .map_err(|_| AppError::BadRequest("Coordenadas fuera de rango".to_string()))?;

        let route = self.require_route(route_id, user).await?;
        Self::require_in_progress(&route, "register an arrival on")?;

        if !self
            .repository
            .arrive(stop_id, route_id, user.tenant_id, Utc::now(), request.lat, request.lng)
            .await?
        {
            return Err(self.visit_failure(stop_id, route_id, user, "arrive at").await?);
        }

        self.invalidate_cache(&route).await;
        self.fresh_stop(stop_id, user).await
    }

    /// salida de la parada; opcionalmente vincula visita y pedido generados
    pub async fn depart(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        user: &AuthenticatedUser,
        request: DepartStopRequest,
    ) -> Result<StopResponse, AppError> {
        request.validate()?;

        let route = self.require_route(route_id, user).await?;
        Self::require_in_progress(&route, "register a departure on")?;

        if !self
            .repository
            .depart(
                stop_id,
                route_id,
                user.tenant_id,
                Utc::now(),
                request.visit_id,
                request.order_id,
                request.notes.as_deref(),
            )
            .await?
        {
            return Err(self.visit_failure(stop_id, route_id, user, "depart from").await?);
        }

        self.invalidate_cache(&route).await;
        self.fresh_stop(stop_id, user).await
    }

    /// saltar la parada, con motivo obligatorio
    pub async fn skip(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        user: &AuthenticatedUser,
        request: SkipStopRequest,
    ) -> Result<StopResponse, AppError> {
        request.validate()?;
        if validate_not_empty(&request.reason).is_err() {
            return Err(AppError::BadRequest(
                "El motivo del salto no puede estar en blanco".to_string(),
            ));
        }

        let route = self.require_route(route_id, user).await?;
        Self::require_in_progress(&route, "skip a stop on")?;

        if !self
            .repository
            .skip(stop_id, route_id, user.tenant_id, &request.reason)
            .await?
        {
            return Err(self.visit_failure(stop_id, route_id, user, "skip").await?);
        }

        self.invalidate_cache(&route).await;
        info!("⏭️ Parada {} saltada: {}", stop_id, request.reason);
        self.fresh_stop(stop_id, user).await
    }

    /// Parada actual: visitada y aún sin salida registrada
    pub async fn current(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Option<StopResponse>, AppError> {
        self.require_route(route_id, user).await?;

        match self.repository.find_current(route_id, user.tenant_id).await? {
            Some(stop) => Ok(self.enrich(vec![stop], user).await?.pop()),
            None => Ok(None),
        }
    }

    /// Siguiente parada por visitar, en orden de itinerario
    pub async fn next(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Option<StopResponse>, AppError> {
        self.require_route(route_id, user).await?;

        match self.repository.find_next(route_id, user.tenant_id).await? {
            Some(stop) => Ok(self.enrich(vec![stop], user).await?.pop()),
            None => Ok(None),
        }
    }

    // --- Helpers ---

    async fn require_route(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Route, AppError> {
        self.routes
            .find_by_id(route_id, user.tenant_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))
    }

    fn require_planning(route: &Route, operation: &str) -> Result<(), AppError> {
        if !route.status.allows_planning_edits() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                operation,
            ));
        }
        Ok(())
    }

    fn require_in_progress(route: &Route, operation: &str) -> Result<(), AppError> {
        if route.status != RouteStatus::InProgress {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                operation,
            ));
        }
        Ok(())
    }

    /// Distinguir parada inexistente de transición de visita inválida
    async fn visit_failure(
        &self,
        stop_id: Uuid,
        route_id: Uuid,
        user: &AuthenticatedUser,
        operation: &str,
    ) -> Result<AppError, AppError> {
        let stop = self.repository.find_by_id(stop_id, user.tenant_id).await?;
        Ok(classify_visit_failure(stop_id, route_id, stop, operation))
    }

    async fn fresh_stop(
        &self,
        stop_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<StopResponse, AppError> {
        let stop = self
            .repository
            .find_by_id(stop_id, user.tenant_id)
            .await?
            .ok_or_else(|| not_found_error("Stop", &stop_id.to_string()))?;

        let clients = self
            .clients
            .find_by_ids(user.tenant_id, &[stop.client_id])
            .await?;

        Ok(StopResponse::from_stop(stop, clients.first()))
    }

    async fn enrich(
        &self,
        stops: Vec<Stop>,
        user: &AuthenticatedUser,
    ) -> Result<Vec<StopResponse>, AppError> {
        let client_ids: Vec<Uuid> = stops.iter().map(|s| s.client_id).collect();
        let clients = self.clients.find_by_ids(user.tenant_id, &client_ids).await?;

        Ok(stops
            .into_iter()
            .map(|stop| {
                let client = clients.iter().find(|c| c.id == stop.client_id);
                StopResponse::from_stop(stop, client)
            })
            .collect())
    }

    async fn invalidate_cache(&self, route: &Route) {
        if let Err(e) = self
            .cache
            .invalidate(route.tenant_id, route.salesperson_id, route.route_date)
            .await
        {
            tracing::warn!("⚠️ No se pudo invalidar el cache de ruta: {}", e);
        }
    }
}

/// Clasificar el fallo de una transición de visita que no afectó filas.
///
/// Una parada que pertenece a otra ruta (o está inactiva) se reporta como
/// no encontrada: la pertenencia al padre del path es parte del scope, no
/// un conflicto de estado.
fn classify_visit_failure(
    stop_id: Uuid,
    route_id: Uuid,
    stop: Option<Stop>,
    operation: &str,
) -> AppError {
    match stop {
        Some(stop) if stop.route_id == route_id && stop.active => {
            invalid_transition_error("stop", stop.status.as_str(), operation)
        }
        _ => not_found_error("Stop", &stop_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stop::StopStatus;
    use chrono::Utc;

    fn stop_in(route_id: Uuid, status: StopStatus) -> Stop {
        Stop {
            id: Uuid::new_v4(),
            route_id,
            tenant_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            visit_order: 1,
            estimated_arrival: None,
            estimated_duration_min: None,
            actual_arrival: None,
            actual_departure: None,
            status,
            visit_id: None,
            order_id: None,
            notes: None,
            skip_reason: None,
            distance_from_prev_km: None,
            arrival_lat: None,
            arrival_lng: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stop_of_another_route_is_not_found() {
        // La parada existe para el tenant pero cuelga de otra ruta: el
        // scope del path manda y se reporta como no encontrada, nunca
        // como conflicto de estado de la otra ruta.
        let route_a = Uuid::new_v4();
        let route_b = Uuid::new_v4();
        let stop = stop_in(route_b, StopStatus::Pending);
        let stop_id = stop.id;

        let err = classify_visit_failure(stop_id, route_a, Some(stop), "arrive at");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_inactive_stop_is_not_found() {
        let route_id = Uuid::new_v4();
        let mut stop = stop_in(route_id, StopStatus::Pending);
        stop.active = false;

        let err = classify_visit_failure(stop.id, route_id, Some(stop), "skip");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_invalid_visit_transition_is_conflict() {
        let route_id = Uuid::new_v4();
        let stop = stop_in(route_id, StopStatus::Visited);

        let err = classify_visit_failure(stop.id, route_id, Some(stop), "arrive at");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_missing_stop_is_not_found() {
        let err = classify_visit_failure(Uuid::new_v4(), Uuid::new_v4(), None, "depart from");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
