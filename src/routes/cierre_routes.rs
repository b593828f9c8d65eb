//! Rutas HTTP del cierre y la conciliación
//!
//! Resumen de cierre e inventario de retorno, anidados bajo la ruta.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::cierre_controller::CierreController;
use crate::dto::cierre_dto::{BulkAssignRequest, RetornoResponse, UpdateRetornoRequest};
use crate::dto::common::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::cierre::ClosingSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_cierre_router() -> Router<AppState> {
    Router::new()
        .route("/:id/closing/summary", get(closing_summary))
        .route("/:id/retornos", get(list_retornos))
        .route("/:id/retornos/bulk-assign", post(bulk_assign_retornos))
        .route("/:id/retornos/:product_id", put(update_retorno))
}

async fn closing_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClosingSummary>, AppError> {
    let controller = CierreController::new(state.pool.clone());
    let response = controller.summary(id, &user).await?;
    Ok(Json(response))
}

async fn list_retornos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RetornoResponse>>, AppError> {
    let controller = CierreController::new(state.pool.clone());
    let response = controller.list_retornos(id, &user).await?;
    Ok(Json(response))
}

async fn update_retorno(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateRetornoRequest>,
) -> Result<Json<RetornoResponse>, AppError> {
    let controller = CierreController::new(state.pool.clone());
    let response = controller.update_line(id, product_id, &user, request).await?;
    Ok(Json(response))
}

async fn bulk_assign_retornos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<BulkAssignRequest>,
) -> Result<Json<ApiResponse<Vec<RetornoResponse>>>, AppError> {
    let controller = CierreController::new(state.pool.clone());
    let response = controller.bulk_assign(id, &user, request).await?;
    Ok(Json(response))
}
