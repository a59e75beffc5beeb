//! Learner HTTP API
//!
//! REST front end over `learner-core`: skill CRUD, theory CRUD, the theory
//! tree operations (materialize, append, move), and the profession, quest and
//! user-progress catalog.
//!
//! # Architecture
//!
//! Endpoints are grouped in modules under [`routes`]; each exposes a
//! `routes(state)` function merged by [`create_router`]. Handlers only
//! translate between HTTP and the services; every rule lives in
//! `learner_core::services`. Request bodies, query strings and path segments
//! go through the extractors in `extract`, so malformed input answers with the
//! same JSON error body as every other failure.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin learner-server
//! LEARNER_PORT=3002 RUST_LOG=debug cargo run --bin learner-server
//! ```

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use learner_core::db::{CatalogStore, DatabaseService, LibsqlTheoryStore, TheoryStore};
use learner_core::services::{
    ProfessionService, ProgressService, QuestService, SkillService, TheoryService,
};

pub mod config;
mod extract;
mod http_error;
pub mod routes;

pub use config::ServerConfig;
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub skills: SkillService,
    pub theories: TheoryService,
    pub professions: ProfessionService,
    pub quests: QuestService,
    pub progress: ProgressService,
}

impl AppState {
    /// Wire every service over one store, sharing one event channel
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: TheoryStore + CatalogStore + 'static,
    {
        let theories = TheoryService::new(store.clone());
        let events = theories.event_sender();
        Self {
            skills: SkillService::new(store.clone(), events.clone()),
            professions: ProfessionService::new(store.clone(), store.clone(), events.clone()),
            quests: QuestService::new(store.clone(), store.clone(), events.clone()),
            progress: ProgressService::new(store.clone(), store, events),
            theories,
        }
    }

    /// Apply a deadline to every tree operation
    pub fn with_request_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.theories = self.theories.with_deadline(timeout);
        self
    }
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::skill_endpoints::routes(state.clone()))
        .merge(routes::theory_endpoints::routes(state.clone()))
        .merge(routes::profession_endpoints::routes(state.clone()))
        .merge(routes::quest_endpoints::routes(state.clone()))
        .merge(routes::progress_endpoints::routes(state))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Create CORS layer restricted to the configured origins
///
/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(Any)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Open the database, build the services and serve until Ctrl-C
///
/// # Errors
///
/// Returns error if the database cannot be opened or the server fails to
/// bind or start.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("📦 Database: {}", config.db_path.display());
    let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
    let store = Arc::new(LibsqlTheoryStore::new(db));

    let state = AppState::new(store.clone()).with_request_timeout(config.request_timeout);
    let app = create_router(state, &config.cors_origins);

    let addr = config.socket_addr();
    tracing::info!("🚀 HTTP server starting on http://{}", addr);
    tracing::info!("📡 CORS enabled for {:?}", config.cors_origins);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, checkpointing database");
    store.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
