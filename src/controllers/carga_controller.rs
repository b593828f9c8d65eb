//! Controller de Carga
//!
//! Reglas de negocio del ledger de carga. El ledger es editable solo
//! mientras la ruta está en Planned; desde el despacho en adelante queda
//! congelado y solo se consulta.

use tracing::info;
use uuid::Uuid;

use crate::cache::RouteCache;
use crate::clients::product_catalog::ProductCatalogClient;
use crate::dto::carga_dto::{AssignCargaRequest, CargaResponse};
use crate::dto::common::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::route::Route;
use crate::repositories::carga_repository::CargaRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{bad_request_error, invalid_transition_error, not_found_error, AppError};
use crate::utils::validation::validate_non_negative;

pub struct CargaController {
    repository: CargaRepository,
    routes: RouteRepository,
    products: ProductCatalogClient,
    cache: RouteCache,
}

impl CargaController {
    pub fn new(pool: sqlx::PgPool, cache: RouteCache) -> Self {
        Self {
            repository: CargaRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            products: ProductCatalogClient::new(pool),
            cache,
        }
    }

    /// Carga activa de la ruta, enriquecida con catálogo y existencias
    pub async fn list(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Vec<CargaResponse>, AppError> {
        self.require_route(route_id, user).await?;

        let entries = self
            .repository
            .find_active_by_route(route_id, user.tenant_id)
            .await?;

        let product_ids: Vec<Uuid> = entries.iter().map(|e| e.product_id).collect();
        let products = self.products.find_by_ids(user.tenant_id, &product_ids).await?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let product = products.iter().find(|p| p.id == entry.product_id);
                CargaResponse::from_entry(entry, product)
            })
            .collect())
    }

    /// Asignar o actualizar la cantidad de venta de un producto.
    ///
    /// Si la cantidad resultante deja la entrada en total cero, el upsert
    /// la desactiva en la misma transacción y la respuesta ya la trae
    /// con active = false.
    pub async fn assign(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
        request: AssignCargaRequest,
    ) -> Result<ApiResponse<CargaResponse>, AppError> {
        if validate_non_negative(request.qty_sale).is_err() {
            return Err(bad_request_error("La cantidad de venta no puede ser negativa"));
        }
        if let Some(price) = request.unit_price {
            if validate_non_negative(price).is_err() {
                return Err(bad_request_error("El precio unitario no puede ser negativo"));
            }
        }

        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "assign cargo to")?;

        if !self.products.exists(user.tenant_id, request.product_id).await? {
            return Err(not_found_error("Product", &request.product_id.to_string()));
        }

        let entry = self
            .repository
            .upsert_sale(
                route_id,
                user.tenant_id,
                request.product_id,
                request.qty_sale,
                request.unit_price,
            )
            .await?;

        self.invalidate_cache(&route).await;
        info!(
            "📦 Carga asignada en ruta {}: producto {} x{}",
            route_id, request.product_id, request.qty_sale
        );

        let products = self
            .products
            .find_by_ids(user.tenant_id, &[entry.product_id])
            .await?;

        Ok(ApiResponse::success_with_message(
            CargaResponse::from_entry(entry, products.first()),
            "Carga actualizada exitosamente".to_string(),
        ))
    }

    /// Quitar un producto de la carga
    pub async fn remove(
        &self,
        route_id: Uuid,
        product_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<(), AppError> {
        let route = self.require_route(route_id, user).await?;
        Self::require_planning(&route, "remove cargo from")?;

        if !self
            .repository
            .deactivate(route_id, user.tenant_id, product_id)
            .await?
        {
            return Err(not_found_error("Carga entry", &product_id.to_string()));
        }

        self.invalidate_cache(&route).await;
        info!("🗑️ Producto {} quitado de la carga de ruta {}", product_id, route_id);
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
