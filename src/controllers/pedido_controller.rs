//! Controller de Pedidos adjuntos
//!
//! Reglas de negocio del attach/detach de pedidos confirmados a una
//! ruta. Solo mientras la ruta sigue en Planned: una vez despachada la
//! carga, el conjunto de pedidos queda congelado junto con el ledger.

use tracing::info;
use uuid::Uuid;

use crate::cache::RouteCache;
use crate::clients::order_client::OrderClient;
use crate::dto::carga_dto::{AttachPedidoRequest, AttachablePedidoResponse};
use crate::dto::common::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::pedido::RoutePedido;
use crate::models::route::Route;
use crate::repositories::pedido_repository::PedidoRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{invalid_transition_error, not_found_error, AppError};

pub struct PedidoController {
    repository: PedidoRepository,
    routes: RouteRepository,
    orders: OrderClient,
    cache: RouteCache,
}

impl PedidoController {
    pub fn new(pool: sqlx::PgPool, cache: RouteCache) -> Self {
        Self {
            repository: PedidoRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            orders: OrderClient::new(pool),
            cache,
        }
    }

    /// Pedidos confirmados disponibles para adjuntar a alguna ruta
    pub async fn attachable(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<Vec<AttachablePedidoResponse>, AppError> {
        let pedidos = self.orders.find_attachable(user.tenant_id).await?;
        Ok(pedidos.into_iter().map(Into::into).collect())
    }

    /// Vínculos activos de la ruta
    pub async fn list(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Vec<RoutePedido>, AppError> {
        self.require_route(route_id, user).await?;
        self.repository.find_by_route(route_id, user.tenant_id).await
    }

    /// Adjuntar un pedido: crea el vínculo y expande sus líneas al ledger
    pub async fn attach(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
        request: AttachPedidoRequest,
    ) -> Result<ApiResponse<RoutePedido>, AppError> {
        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "attach an order to")?;

        let header = self
            .orders
            .find_header(user.tenant_id, request.pedido_id)
            .await?
            .ok_or_else(|| not_found_error("Pedido", &request.pedido_id.to_string()))?;

        if header.status != "confirmed" {
            return Err(AppError::BadRequest(format!(
                "Solo se pueden adjuntar pedidos confirmados; este está '{}'",
                header.status
            )));
        }

        if self
            .repository
            .find_active(route_id, user.tenant_id, request.pedido_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "El pedido ya está adjunto a esta ruta".to_string(),
            ));
        }

        let lines = self
            .orders
            .find_lines(user.tenant_id, request.pedido_id)
            .await?;
        if lines.is_empty() {
            return Err(AppError::BadRequest(
                "El pedido no tiene líneas que entregar".to_string(),
            ));
        }

        let attachment = self
            .repository
            .attach(route_id, user.tenant_id, request.pedido_id, &lines)
            .await?;

        self.invalidate_cache(&route).await;
        info!(
            "🔗 Pedido {} adjuntado a ruta {} ({} líneas)",
            request.pedido_id,
            route_id,
            lines.len()
        );

        Ok(ApiResponse::success_with_message(
            attachment,
            "Pedido adjuntado exitosamente".to_string(),
        ))
    }

    /// Desprender un pedido: desactiva el vínculo y revierte el ledger
    pub async fn detach(
        &self,
        route_id: Uuid,
        pedido_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<(), AppError> {
        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "detach an order from")?;

        let lines = self.orders.find_lines(user.tenant_id, pedido_id).await?;

        if !self
            .repository
            .detach(route_id, user.tenant_id, pedido_id, &lines)
            .await?
        {
            return Err(not_found_error("Attachment", &pedido_id.to_string()));
        }

        self.invalidate_cache(&route).await;
        info!("✂️ Pedido {} desprendido de ruta {}", pedido_id, route_id);
        Ok(())
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
