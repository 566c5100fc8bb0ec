//! Web layer module
//!
//! HTTP interface for the live TV service: the stream relay, catalog and
//! channel queries, and the user's preferences. Handlers are thin and
//! delegate to the catalog, preference and relay components held in
//! [`AppState`].

use anyhow::Result;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    catalog::{CatalogStore, PreferenceStore},
    config::Config,
    relay::StreamResolver,
};

pub mod handlers;
pub mod responses;

pub use responses::{handle_error, handle_result, ok, ApiResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        let app = create_router(state);

        Ok(Self { app, addr })
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let relay_path = state.resolver.relay_path().to_string();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(&relay_path, get(handlers::relay::relay_stream))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/catalog", get(handlers::catalog::get_catalog))
        .route("/catalog/refresh", post(handlers::catalog::refresh_catalog))
        // Channels
        .route("/channels/search", get(handlers::catalog::search_channels))
        .route("/channels/featured", get(handlers::catalog::featured_channels))
        .route("/channels/grouped", get(handlers::catalog::grouped_channels))
        .route("/channels/{id}", get(handlers::catalog::get_channel))
        .route(
            "/channels/{id}/related",
            get(handlers::catalog::related_channels),
        )
        // Preferences
        .route("/preferences", get(handlers::preferences::get_preferences))
        .route(
            "/favorites/{id}",
            post(handlers::preferences::toggle_favorite),
        )
        .route("/recent/{id}", post(handlers::preferences::add_recent))
        .route("/settings", patch(handlers::preferences::update_settings))
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogStore,
    pub preferences: PreferenceStore,
    pub resolver: Arc<StreamResolver>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: CatalogStore,
        preferences: PreferenceStore,
        resolver: StreamResolver,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            preferences,
            resolver: Arc::new(resolver),
        }
    }
}
