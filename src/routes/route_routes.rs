//! Rutas HTTP del agregado Route
//!
//! CRUD, ciclo de vida y el itinerario anidado de paradas. Todos los
//! handlers reciben la identidad inyectada por el middleware de auth.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::controllers::stop_controller::StopController;
use crate::dto::common::ApiResponse;
use crate::dto::route_dto::{
    BatchActiveRequest, CancelRouteRequest, CloseRouteRequest, CompleteRouteRequest,
    CreateRouteRequest, RouteDetailResponse, RouteFilters, RouteListResponse, RouteResponse,
    UpdateRouteRequest,
};
use crate::dto::stop_dto::{
    ArriveStopRequest, CreateStopRequest, DepartStopRequest, ReorderStopsRequest,
    SkipStopRequest, StopResponse,
};
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_route))
        .route("/", get(list_routes))
        .route("/my/pending", get(my_pending_routes))
        .route("/my/today", get(my_today_route))
        .route("/batch/active", patch(set_active_batch))
        .route("/:id", get(get_route))
        .route("/:id", put(update_route))
        .route("/:id", delete(delete_route))
        .route("/:id/dispatch", post(dispatch_route))
        .route("/:id/accept-load", post(accept_load))
        .route("/:id/start", post(start_route))
        .route("/:id/complete", post(complete_route))
        .route("/:id/close", post(close_route))
        .route("/:id/cancel", post(cancel_route))
        .route("/:id/stops", get(list_stops))
        .route("/:id/stops", post(create_stop))
        .route("/:id/stops/reorder", put(reorder_stops))
        .route("/:id/stops/current", get(current_stop))
        .route("/:id/stops/next", get(next_stop))
        .route("/:id/stops/:stop_id", delete(remove_stop))
        .route("/:id/stops/:stop_id/arrive", post(arrive_stop))
        .route("/:id/stops/:stop_id/depart", post(depart_stop))
        .route("/:id/stops/:stop_id/skip", post(skip_stop))
}

// --- Store de rutas ---

async fn create_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.create(&user, request).await?;
    Ok(Json(response))
}

async fn get_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteDetailResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.get_detail(id, &user).await?;
    Ok(Json(response))
}

async fn list_routes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<RouteFilters>,
) -> Result<Json<RouteListResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.list(&user, filters).await?;
    Ok(Json(response))
}

async fn update_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.update(id, &user, request).await?;
    Ok(Json(response))
}

async fn delete_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    controller.delete(id, &user).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Ruta desactivada exitosamente"
    })))
}

async fn set_active_batch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<BatchActiveRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let updated = controller.set_active_batch(&user, request).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "updated": updated
    })))
}

async fn my_pending_routes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.my_pending(&user).await?;
    Ok(Json(response))
}

async fn my_today_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<RouteDetailResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.today(&user).await?;
    Ok(Json(response))
}

// --- Ciclo de vida ---

async fn dispatch_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.dispatch(id, &user).await?;
    Ok(Json(response))
}

async fn accept_load(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.accept_load(id, &user).await?;
    Ok(Json(response))
}

async fn start_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.start(id, &user).await?;
    Ok(Json(response))
}

async fn complete_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.complete(id, &user, request).await?;
    Ok(Json(response))
}

async fn close_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CloseRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.close(id, &user, request).await?;
    Ok(Json(response))
}

async fn cancel_route(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.cancel(id, &user, request).await?;
    Ok(Json(response))
}

// --- Itinerario ---

async fn list_stops(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StopResponse>>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.list(id, &user).await?;
    Ok(Json(response))
}

async fn create_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateStopRequest>,
) -> Result<Json<ApiResponse<StopResponse>>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.create(id, &user, request).await?;
    Ok(Json(response))
}

async fn remove_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    controller.remove(id, stop_id, &user).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Parada quitada exitosamente"
    })))
}

async fn reorder_stops(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReorderStopsRequest>,
) -> Result<Json<Vec<StopResponse>>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.reorder(id, &user, request).await?;
    Ok(Json(response))
}

async fn arrive_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ArriveStopRequest>,
) -> Result<Json<StopResponse>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.arrive(id, stop_id, &user, request).await?;
    Ok(Json(response))
}

async fn depart_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<DepartStopRequest>,
) -> Result<Json<StopResponse>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.depart(id, stop_id, &user, request).await?;
    Ok(Json(response))
}

async fn skip_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((id, stop_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SkipStopRequest>,
) -> Result<Json<StopResponse>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.skip(id, stop_id, &user, request).await?;
    Ok(Json(response))
}

async fn current_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<StopResponse>>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.current(id, &user).await?;
    Ok(Json(response))
}

async fn next_stop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<StopResponse>>, AppError> {
    let controller = StopController::new(state.pool.clone(), state.route_cache.clone());
    let response = controller.next(id, &user).await?;
    Ok(Json(response))
}
