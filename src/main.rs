mod cache;
mod clients;
mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod utils;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use cache::{CacheConfig, RedisClient};
use config::environment::EnvironmentConfig;
use database::connection::{create_pool, mask_database_url};
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::default();

    // Configurar logging: DEBUG solo en desarrollo
    let log_level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("🚚 Ruta Ventas - Motor de rutas de venta en campo");
    info!("=================================================");

    // Inicializar base de datos
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    info!("🔗 Conectando a PostgreSQL: {}", mask_database_url(&database_url));

    let pool = match create_pool(Some(&database_url)).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Inicializar Redis y cache
    let redis_config = CacheConfig {
        redis_url: config.redis_url.clone(),
        default_ttl: config.cache_ttl_seconds,
        max_connections: 10,
    };

    let redis_client = match RedisClient::new(redis_config).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(anyhow::anyhow!("Error de Redis: {}", e));
        }
    };

    // Armar el router de la API
    let app_state = AppState::new(pool, config.clone(), redis_client);

    // En producción CORS se restringe a los orígenes configurados
    let cors = if config.is_production() {
        cors_middleware_with_origins(config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    let app = Router::new()
        .merge(routes::create_api_router(app_state.clone()))
        .layer(cors)
        .with_state(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health - Health check");
    info!("🗺️ Rutas:");
    info!("   POST   /api/routes - Crear ruta");
    info!("   GET    /api/routes - Listar rutas con filtros");
    info!("   GET    /api/routes/:id - Ruta con itinerario");
    info!("   PUT    /api/routes/:id - Actualizar ruta");
    info!("   DELETE /api/routes/:id - Desactivar ruta");
    info!("   PATCH  /api/routes/batch/active - Activar/desactivar en bloque");
    info!("   GET    /api/routes/my/pending - Rutas pendientes del vendedor");
    info!("   GET    /api/routes/my/today - Ruta de hoy del vendedor");
    info!("🔄 Ciclo de vida:");
    info!("   POST   /api/routes/:id/dispatch - Despachar carga");
    info!("   POST   /api/routes/:id/accept-load - Aceptar carga");
    info!("   POST   /api/routes/:id/start - Iniciar ruta");
    info!("   POST   /api/routes/:id/complete - Completar ruta");
    info!("   POST   /api/routes/:id/close - Cerrar ruta");
    info!("   POST   /api/routes/:id/cancel - Cancelar ruta");
    info!("📍 Itinerario:");
    info!("   GET    /api/routes/:id/stops - Listar paradas");
    info!("   POST   /api/routes/:id/stops - Agregar parada");
    info!("   PUT    /api/routes/:id/stops/reorder - Reordenar itinerario");
    info!("   DELETE /api/routes/:id/stops/:stop_id - Quitar parada");
    info!("   POST   /api/routes/:id/stops/:stop_id/arrive - Llegada");
    info!("   POST   /api/routes/:id/stops/:stop_id/depart - Salida");
    info!("   POST   /api/routes/:id/stops/:stop_id/skip - Saltar parada");
    info!("   GET    /api/routes/:id/stops/current - Parada actual");
    info!("   GET    /api/routes/:id/stops/next - Siguiente parada");
    info!("📦 Carga y pedidos:");
    info!("   GET    /api/routes/:id/cargas - Carga de la ruta");
    info!("   PUT    /api/routes/:id/cargas - Asignar producto");
    info!("   DELETE /api/routes/:id/cargas/:product_id - Quitar producto");
    info!("   GET    /api/routes/:id/pedidos - Pedidos adjuntos");
    info!("   POST   /api/routes/:id/pedidos - Adjuntar pedido");
    info!("   DELETE /api/routes/:id/pedidos/:pedido_id - Desprender pedido");
    info!("   GET    /api/pedidos/attachable - Pedidos disponibles");
    info!("🔒 Cierre:");
    info!("   GET    /api/routes/:id/closing/summary - Resumen de cierre");
    info!("   GET    /api/routes/:id/retornos - Inventario de retorno");
    info!("   PUT    /api/routes/:id/retornos/:product_id - Actualizar línea");
    info!("   POST   /api/routes/:id/retornos/bulk-assign - Asignación masiva");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
