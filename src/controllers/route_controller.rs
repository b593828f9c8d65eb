//! Controller de Rutas
//!
//! Reglas de negocio del store de rutas y de las transiciones del ciclo
//! de vida. Toda operación está delimitada por tenant: un id de otro
//! tenant se reporta como no encontrado, nunca como prohibido.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::cache::RouteCache;
use crate::clients::client_directory::ClientDirectoryClient;
use crate::dto::common::ApiResponse;
use crate::dto::route_dto::{
    BatchActiveRequest, CancelRouteRequest, CloseRouteRequest, CompleteRouteRequest,
    CreateRouteRequest, RouteDetailResponse, RouteFilters, RouteListResponse, RouteResponse,
    UpdateRouteRequest,
};
use crate::dto::stop_dto::StopResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::route::{Route, RouteStatus};
use crate::repositories::carga_repository::CargaRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::stop_repository::StopRepository;
use crate::utils::errors::{bad_request_error, invalid_transition_error, not_found_error, AppError};
use crate::utils::validation::{validate_non_negative, validate_not_empty};

pub struct RouteController {
    repository: RouteRepository,
    stops: StopRepository,
    cargas: CargaRepository,
    clients: ClientDirectoryClient,
    cache: RouteCache,
}

impl RouteController {
    pub fn new(pool: sqlx::PgPool, cache: RouteCache) -> Self {
        Self {
            repository: RouteRepository::new(pool.clone()),
            stops: StopRepository::new(pool.clone()),
            cargas: CargaRepository::new(pool.clone()),
            clients: ClientDirectoryClient::new(pool),
            cache,
        }
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;

        let route = self.repository.create(user.tenant_id, request).await?;
        info!("🗺️ Ruta creada: {} ({})", route.name, route.id);

        Ok(ApiResponse::success_with_message(
            route.into(),
            "Ruta creada exitosamente".to_string(),
        ))
    }

    /// Ruta con su itinerario, paradas enriquecidas con el directorio
    pub async fn get_detail(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<RouteDetailResponse, AppError> {
        let route = self.require_route(id, user).await?;
        self.build_detail(route, user).await
    }

    async fn build_detail(
        &self,
        route: Route,
        user: &AuthenticatedUser,
    ) -> Result<RouteDetailResponse, AppError> {
        let stops = self.stops.find_by_route(route.id, user.tenant_id).await?;

        let client_ids: Vec<Uuid> = stops.iter().map(|s| s.client_id).collect();
        let clients = self.clients.find_by_ids(user.tenant_id, &client_ids).await?;

        let stops = stops
            .into_iter()
            .map(|stop| {
                let client = clients.iter().find(|c| c.id == stop.client_id);
                StopResponse::from_stop(stop, client)
            })
            .collect();

        Ok(RouteDetailResponse {
            route: route.into(),
            stops,
        })
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        filters: RouteFilters,
    ) -> Result<RouteListResponse, AppError> {
        let limit = filters.limit.unwrap_or(50).clamp(1, 200);
        let offset = filters.offset.unwrap_or(0).max(0);

        let (routes, total) = self.repository.list(user.tenant_id, &filters).await?;

        Ok(RouteListResponse {
            routes: routes.into_iter().map(Into::into).collect(),
            total,
            limit,
            offset,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        request: UpdateRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;

        let current = self.require_route(id, user).await?;
        if current.status.is_terminal() {
            return Err(invalid_transition_error(
                "route",
                current.status.as_str(),
                "update",
            ));
        }

        let route = self
            .repository
            .update(id, user.tenant_id, request)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))?;

        self.invalidate_cache(&route).await;

        Ok(ApiResponse::success_with_message(
            route.into(),
            "Ruta actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid, user: &AuthenticatedUser) -> Result<(), AppError> {
        let route = self.require_route(id, user).await?;

        self.repository.soft_delete(id, user.tenant_id).await?;
        self.invalidate_cache(&route).await;

        info!("🗑️ Ruta desactivada: {}", id);
        Ok(())
    }

    pub async fn set_active_batch(
        &self,
        user: &AuthenticatedUser,
        request: BatchActiveRequest,
    ) -> Result<u64, AppError> {
        request.validate()?;

        let updated = self
            .repository
            .set_active_batch(user.tenant_id, &request.route_ids, request.active)
            .await?;

        info!("📦 Batch de rutas actualizado: {} filas", updated);
        Ok(updated)
    }

    /// Rutas pendientes del vendedor autenticado
    pub async fn my_pending(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<RouteResponse>, AppError> {
        let today = Utc::now().date_naive();
        let routes = self
            .repository
            .find_pending_for_salesperson(user.tenant_id, user.user_id, today)
            .await?;

        Ok(routes.into_iter().map(Into::into).collect())
    }

    /// La ruta de hoy del vendedor autenticado, cacheada en Redis
    pub async fn today(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<RouteDetailResponse, AppError> {
        let today = Utc::now().date_naive();

        if let Ok(Some(cached)) = self
            .cache
            .get_today::<RouteDetailResponse>(user.tenant_id, user.user_id, today)
            .await
        {
            return Ok(cached);
        }

        let route = self
            .repository
            .find_today_for_salesperson(user.tenant_id, user.user_id, today)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No hay ruta programada para hoy".to_string())
            })?;

        let detail = self.build_detail(route, user).await?;

        if let Err(e) = self
            .cache
            .set_today(user.tenant_id, user.user_id, today, &detail)
            .await
        {
            tracing::warn!("⚠️ No se pudo cachear la ruta de hoy: {}", e);
        }

        Ok(detail)
    }

    // --- Ciclo de vida ---

    /// despachar carga: requiere al menos una entrada activa en el ledger.
    ///
    /// El UPDATE guardado verifica el EXISTS de carga en la misma sentencia;
    /// aquí solo se traduce el fallo a 400 (sin carga) o 409 (estado).
    pub async fn dispatch(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.require_route(id, user).await?;
        let carga_count = self.cargas.count_active(id, user.tenant_id).await?;
        Self::dispatch_gate(route.status, carga_count)?;

        if !self.repository.dispatch(id, user.tenant_id).await? {
            // La ruta o su carga cambiaron entre la verificación y el UPDATE
            let fresh = self.require_route(id, user).await?;
            let carga_count = self.cargas.count_active(id, user.tenant_id).await?;
            Self::dispatch_gate(fresh.status, carga_count)?;
            return Err(invalid_transition_error(
                "route",
                fresh.status.as_str(),
                "dispatch",
            ));
        }

        self.invalidate_cache(&route).await;
        info!("🚚 Carga despachada para ruta {}", id);
        self.fresh_response(id, user, "Carga despachada").await
    }

    /// Precondición de despacho: estado Planned y ledger con carga
    fn dispatch_gate(status: RouteStatus, active_cargas: i64) -> Result<(), AppError> {
        if !status.can_dispatch() {
            return Err(invalid_transition_error("route", status.as_str(), "dispatch"));
        }
        if active_cargas == 0 {
            return Err(AppError::BadRequest(
                "No se puede despachar una ruta sin carga asignada".to_string(),
            ));
        }
        Ok(())
    }

    /// el vendedor confirma la recepción física de la carga
    pub async fn accept_load(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.require_route(id, user).await?;
        if !route.status.can_accept_load() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "accept load for",
            ));
        }

        if !self.repository.accept_load(id, user.tenant_id).await? {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "accept load for",
            ));
        }

        self.invalidate_cache(&route).await;
        self.fresh_response(id, user, "Carga aceptada").await
    }

    pub async fn start(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.require_route(id, user).await?;
        if !route.status.can_start() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "start",
            ));
        }

        if !self.repository.start(id, user.tenant_id, Utc::now()).await? {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "start",
            ));
        }

        self.invalidate_cache(&route).await;
        info!("🏁 Ruta iniciada: {}", id);
        self.fresh_response(id, user, "Ruta iniciada").await
    }

    pub async fn complete(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        request: CompleteRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.require_route(id, user).await?;
        if !route.status.can_complete() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "complete",
            ));
        }

        if !self
            .repository
            .complete(id, user.tenant_id, Utc::now(), request.actual_distance_km)
            .await?
        {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "complete",
            ));
        }

        self.invalidate_cache(&route).await;
        info!("🏁 Ruta completada: {}", id);
        self.fresh_response(id, user, "Ruta completada").await
    }

    /// cerrar: terminal, persiste el efectivo recibido y quién cerró
    pub async fn close(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        request: CloseRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        if validate_non_negative(request.cash_received).is_err() {
            return Err(bad_request_error("El efectivo recibido no puede ser negativo"));
        }

        let route = self.require_route(id, user).await?;
        if !route.status.can_close() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "close",
            ));
        }

        if !self
            .repository
            .close(
                id,
                user.tenant_id,
                request.cash_received,
                &user.display_name,
                Utc::now(),
            )
            .await?
        {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "close",
            ));
        }

        self.invalidate_cache(&route).await;
        info!("🔒 Ruta cerrada: {} por {}", id, user.display_name);
        self.fresh_response(id, user, "Ruta cerrada").await
    }

    /// cancelar: terminal, el motivo se concatena a las notas
    pub async fn cancel(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        request: CancelRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;
        if validate_not_empty(&request.reason).is_err() {
            return Err(bad_request_error(
                "El motivo de cancelación no puede estar en blanco",
            ));
        }

        let route = self.require_route(id, user).await?;
        if !route.status.can_cancel() {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "cancel",
            ));
        }

        if !self
            .repository
            .cancel(id, user.tenant_id, &request.reason)
            .await?
        {
            return Err(invalid_transition_error(
                "route",
                route.status.as_str(),
                "cancel",
            ));
        }

        self.invalidate_cache(&route).await;
        info!("🚫 Ruta cancelada: {}", id);
        self.fresh_response(id, user, "Ruta cancelada").await
    }

    // --- Helpers ---

    async fn require_route(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Route, AppError> {
        self.repository
            .find_by_id(id, user.tenant_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))
    }

    async fn fresh_response(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
        message: &str,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        let route = self.require_route(id, user).await?;
        Ok(ApiResponse::success_with_message(
            route.into(),
            message.to_string(),
        ))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_without_carga_is_bad_request() {
        let err = RouteController::dispatch_gate(RouteStatus::Planned, 0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_dispatch_outside_planned_is_conflict() {
        let err = RouteController::dispatch_gate(RouteStatus::InProgress, 3).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_dispatch_planned_with_carga_passes() {
        assert!(RouteController::dispatch_gate(RouteStatus::Planned, 1).is_ok());
    }
}
