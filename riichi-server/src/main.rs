mod app_state;
mod auth;
mod connection;
mod game_actor;
mod lifecycle;
mod rate_limit;

use crate::app_state::{cleanup_stale, AppState};
use crate::connection::handle_connection;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
/// Activates structured tracing, spawns a watchdog task that sweeps dead
/// game actors, then serves the websocket endpoint. Listens on port 8080.
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let ticket_secret = std::env::var("RIICHI_TICKET_SECRET").unwrap_or_else(|_| {
        tracing::warn!("RIICHI_TICKET_SECRET not set, using an insecure development default");
        "insecure-development-secret".to_string()
    });

    let app_state = Arc::new(AppState::new(ticket_secret.into_bytes()));

    let watchdog_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1200)); // 20 min
        loop {
            interval.tick().await;
            cleanup_stale(&watchdog_state).await;
        }
    });

    let app = Router::new()
        .route("/ws/{game_id}", get(websocket_handler))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();

    axum::serve(listener, app).await.unwrap();
}

/// Upgrades the HTTP request and hands the socket to the per-connection
/// lifecycle once the upgrade completes.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_connection(socket, state, game_id))
}
