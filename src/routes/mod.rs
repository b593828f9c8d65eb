//! Rutas HTTP
//!
//! Este módulo arma el router de la API: los endpoints del subsistema van
//! detrás del middleware de autenticación; /health queda público.

pub mod carga_routes;
pub mod cierre_routes;
pub mod route_routes;

use axum::{extract::State, middleware, routing::get, Json, Router};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest(
            "/api/routes",
            route_routes::create_route_router()
                .merge(carga_routes::create_carga_router())
                .merge(cierre_routes::create_cierre_router()),
        )
        .nest("/api/pedidos", carga_routes::create_pedido_router())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
}

/// Health check sin autenticación; reporta la conectividad de Redis
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let redis_up = state.redis.is_connected().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "ruta_ventas",
        "redis": if redis_up { "up" } else { "down" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
