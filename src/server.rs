use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::actions::BingoService;
use crate::api_handlers::*;
use crate::config::ServerConfig;
use crate::logging::{log_error, log_error_stderr, log_info};

pub struct AppState {
    pub service: BingoService,
}

pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        // Membership
        .route("/profile", get(handle_get_profile).put(handle_set_membership))
        // Games
        .route("/games", get(handle_list_games).post(handle_create_game))
        .route("/games/{game_id}", get(handle_get_game).delete(handle_delete_game))
        // Items
        .route("/games/{game_id}/items", get(handle_list_items).post(handle_create_items))
        .route("/items/{item_id}", patch(handle_update_item).delete(handle_delete_item))
        // Cards
        .route("/games/{game_id}/cards", get(handle_list_cards).post(handle_generate_cards))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_error(&format!("Failed to listen for shutdown signal: {e}"));
        std::future::pending::<()>().await;
    }
    log_info("Shutdown signal received");
}

/// Resolve `host:port` from the config. Names such as `localhost` go
/// through the system resolver; the first address returned is used.
pub async fn resolve_bind_address(config: &ServerConfig) -> std::io::Result<SocketAddr> {
    let bind_address = config.bind_address();
    tokio::net::lookup_host(bind_address.as_str())
        .await?
        .next()
        .ok_or_else(|| std::io::Error::other(format!("{bind_address} did not resolve to any address")))
}

pub fn start_server(config: ServerConfig, service: BingoService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let limits = service.limits();
        let app = build_router(Arc::new(AppState { service }));

        let addr = match resolve_bind_address(&config).await {
            Ok(addr) => addr,
            Err(e) => {
                log_error_stderr(&format!("Cannot resolve listen address {}: {e}", config.bind_address()));
                return;
            }
        };
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log_error_stderr(&format!("Failed to start API server on {addr}: {e}"));
                return;
            }
        };

        log_info(&format!(
            "Server starting on {addr} (items per game: {}, free cards per game: {}, cards per request: {})",
            limits.max_items_per_game, limits.max_cards_free, limits.max_cards_per_request
        ));

        if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
            log_error(&format!("Server error: {err:?}"));
        }

        log_info("Server shutdown complete");
    })
}
