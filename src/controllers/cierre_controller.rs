//! Controller de Cierre
//!
//! Reglas de negocio de la conciliación: el inventario de retorno se
//! materializa en el primer acceso con la ruta en Completed, es editable
//! solo en ese estado y queda de solo lectura al cerrar. El resumen de
//! cierre es derivado y se calcula bajo demanda.

use tracing::info;
use uuid::Uuid;

use crate::clients::cash_ledger::CashLedgerClient;
use crate::clients::product_catalog::ProductCatalogClient;
use crate::dto::cierre_dto::{BulkAssignRequest, RetornoResponse, UpdateRetornoRequest};
use crate::dto::common::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::cierre::ClosingSummary;
use crate::models::route::{Route, RouteStatus};
use crate::repositories::carga_repository::CargaRepository;
use crate::repositories::cierre_repository::CierreRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{bad_request_error, invalid_transition_error, not_found_error, AppError};
use crate::utils::validation::validate_non_negative;

pub struct CierreController {
    repository: CierreRepository,
    routes: RouteRepository,
    cargas: CargaRepository,
    cash_ledger: CashLedgerClient,
    products: ProductCatalogClient,
}

impl CierreController {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            repository: CierreRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            cargas: CargaRepository::new(pool.clone()),
            cash_ledger: CashLedgerClient::new(pool.clone()),
            products: ProductCatalogClient::new(pool),
        }
    }

    /// Resumen de cierre: totales del ledger de cobranza más el esperado
    /// contra lo recibido (si ya se capturó)
    pub async fn summary(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<ClosingSummary, AppError> {
        let route = self.require_route(route_id, user).await?;

        let totals = self
            .cash_ledger
            .route_totals(user.tenant_id, route_id)
            .await?;

        Ok(ClosingSummary::build(
            route_id,
            totals,
            route.initial_cash,
            route.cash_received,
        ))
    }

    /// Inventario de retorno de la ruta.
    ///
    /// Con la ruta en Completed, el primer acceso materializa las líneas
    /// desde el snapshot de carga y lo vendido/entregado según el ledger;
    /// los accesos posteriores solo leen.
    pub async fn list_retornos(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Vec<RetornoResponse>, AppError> {
        let route = self.require_route(route_id, user).await?;

        if route.status == RouteStatus::Completed
            && self.repository.count_active(route_id, user.tenant_id).await? == 0
        {
            let cargas = self
                .cargas
                .find_active_by_route(route_id, user.tenant_id)
                .await?;
            let movements = self
                .cash_ledger
                .route_product_movements(user.tenant_id, route_id)
                .await?;

            self.repository
                .ensure_initialized(route_id, user.tenant_id, &cargas, &movements)
                .await?;

            info!(
                "📋 Inventario de retorno materializado para ruta {} ({} líneas)",
                route_id,
                cargas.len()
            );
        }

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
                RetornoResponse::from_entry(entry, product)
            })
            .collect())
    }

    /// Actualizar los buckets contados de una línea de retorno
    pub async fn update_line(
        &self,
        route_id: Uuid,
        product_id: Uuid,
        user: &AuthenticatedUser,
        request: UpdateRetornoRequest,
    ) -> Result<RetornoResponse, AppError> {
        for qty in [
            request.qty_client_returns,
            request.qty_mermas,
            request.qty_warehouse,
            request.qty_vehicle,
        ]
        .into_iter()
        .flatten()
        {
            if validate_non_negative(qty).is_err() {
                return Err(bad_request_error(
                    "Las cantidades de retorno no pueden ser negativas",
                ));
            }
        }

        let route = self.require_route(route_id, user).await?;
        Self::require_reconciling(route.status, "update return inventory on")?;

        let entry = self
            .repository
            .update_line(
                route_id,
                user.tenant_id,
                product_id,
                request.qty_client_returns,
                request.qty_mermas,
                request.qty_warehouse,
                request.qty_vehicle,
            )
            .await?
            .ok_or_else(|| not_found_error("Retorno entry", &product_id.to_string()))?;

        let products = self
            .products
            .find_by_ids(user.tenant_id, &[entry.product_id])
            .await?;

        Ok(RetornoResponse::from_entry(entry, products.first()))
    }

    /// Enviar todo el remanente positivo al almacén o al vehículo
    pub async fn bulk_assign(
        &self,
        route_id: Uuid,
        user: &AuthenticatedUser,
        request: BulkAssignRequest,
    ) -> Result<ApiResponse<Vec<RetornoResponse>>, AppError> {
        let route = self.require_route(route_id, user).await?;
        Self::require_reconciling(route.status, "bulk-assign returns on")?;

        let updated = self
            .repository
            .bulk_assign(route_id, user.tenant_id, request.destination)
            .await?;

        info!(
            "📦 Remanente de ruta {} asignado en bloque: {} líneas",
            route_id, updated
        );

        let entries = self.list_retornos(route_id, user).await?;
        Ok(ApiResponse::success(entries))
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

    /// El retorno solo es editable con la ruta Completed; cerrada es de
    /// solo lectura y antes de completar aún no existe
    fn require_reconciling(status: RouteStatus, operation: &str) -> Result<(), AppError> {
        if status != RouteStatus::Completed {
            return Err(invalid_transition_error(
                "route",
                status.as_str(),
                operation,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciling_rejects_closed_route() {
        let err = CierreController::require_reconciling(
            RouteStatus::Closed,
            "update return inventory on",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_reconciling_rejects_route_still_in_progress() {
        let err = CierreController::require_reconciling(
            RouteStatus::InProgress,
            "bulk-assign returns on",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_reconciling_allows_completed_route() {
        assert!(CierreController::require_reconciling(
            RouteStatus::Completed,
            "update return inventory on",
        )
        .is_ok());
    }
}
