//! Rutas HTTP del ledger de carga y los pedidos adjuntos
//!
//! Los endpoints de carga y de attach/detach viven anidados bajo la ruta;
//! el listado de pedidos disponibles cuelga de /pedidos.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::carga_controller::CargaController;
use crate::controllers::pedido_controller::PedidoController;
use crate::dto::carga_dto::{
    AssignCargaRequest, AttachPedidoRequest, AttachablePedidoResponse, CargaResponse,
};
use crate::dto::common::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::pedido::RoutePedido;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_carga_router() -> Router<AppState> {
    Router::new()
        .route("/:id/cargas", get(list_cargas))
        .route("/:id/cargas", put(assign_carga))
        .route("/:id/cargas/:product_id", delete(remove_carga))
        .route("/:id/pedidos", get(list_pedidos))
        .route("/:id/pedidos", post(attach_pedido))
        .route("/:id/pedidos/:pedido_id", delete(detach_pedido))
}

pub fn create_pedido_router() -> Router<AppState> {
    Router::new().route("/attachable", get(attachable_pedidos))
}

// --- Ledger de carga ---

async fn list_cargas(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CargaResponse>>, AppError> {
    let controller = CargaController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.list(id, &user).await?;
    Ok(Json(response))
}

async fn assign_carga(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignCargaRequest>,
) -> Result<Json<ApiResponse<CargaResponse>>, AppError> {
    let controller = CargaController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.assign(id, &user, request).await?;
    Ok(Json(response))
}

async fn remove_carga(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = CargaController::new(state.pool.clone(), state.route_cache.clone());
    controller.remove(id, product_id, &user).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Producto quitado de la carga"
    })))
}

// --- Pedidos adjuntos ---

async fn list_pedidos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RoutePedido>>, AppError> {
    let controller = PedidoController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.list(id, &user).await?;
    Ok(Json(response))
}

async fn attach_pedido(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachPedidoRequest>,
) -> Result<Json<ApiResponse<RoutePedido>>, AppError> {
    let controller = PedidoController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.attach(id, &user, request).await?;
    Ok(Json(response))
}

async fn detach_pedido(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, pedido_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = PedidoController::new(state.pool.clone(), state.route_cache.clone());
    controller.detach(id, pedido_id, &user).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Pedido desprendido exitosamente"
    })))
}

async fn attachable_pedidos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<AttachablePedidoResponse>>, AppError> {
    let controller = PedidoController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.attachable(&user).await?;
    Ok(Json(response))
}
