mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod policy;
mod repository;
mod services;
mod storage;
mod views;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::policy::{AccessPolicy, AllowList};
use crate::repository::{ImageStore, SqliteImageStore};
use crate::services::{GoogleOAuth, OAuthProvider};
use crate::storage::{BlobStore, LocalStorage};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub images: Arc<dyn ImageStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub policy: Arc<dyn AccessPolicy>,
    pub oauth: Arc<dyn OAuthProvider>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "framewall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting framewall...");

    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded");

    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    let media_base = format!("{}/media", config.server.public_url.trim_end_matches('/'));
    let blobs = LocalStorage::new(&config.storage.local_path, &media_base);
    tracing::info!(
        "Blob storage: {} at {:?}",
        blobs.storage_type(),
        blobs.base_path()
    );

    let state = AppState {
        images: Arc::new(SqliteImageStore::new(db.clone())),
        blobs: Arc::new(blobs),
        policy: Arc::new(AllowList::new(&config.access.allowed_emails)),
        oauth: Arc::new(GoogleOAuth::new(config.oauth.clone())),
        db,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // The random image is the only cross-origin readable resource
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = state.config.storage.max_upload_mb * 1024 * 1024;

    let public_routes = Router::new()
        .route("/", get(handlers::gallery::index))
        .route(
            "/api/v1/gallery/random",
            get(handlers::gallery::random_image).layer(cors),
        )
        .route("/manage", get(handlers::manage::console))
        .route("/auth/login", get(handlers::auth::login))
        .route("/auth/callback", get(handlers::auth::callback))
        .route("/auth/logout", post(handlers::auth::logout));

    // Signed in and allowed by the access policy
    let manager_routes = Router::new()
        .route("/manage/images", get(handlers::manage::image_list))
        .route(
            "/api/v1/images",
            get(handlers::image::list_images)
                .post(handlers::image::upload_images)
                .layer(DefaultBodyLimit::max(max_upload)),
        )
        .route(
            "/api/v1/images/:id",
            axum::routing::delete(handlers::image::delete_image),
        )
        .route("/api/v1/images/:id/:flag", put(handlers::image::set_flag))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::manager_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(manager_routes)
        .nest_service("/media", ServeDir::new(&state.config.storage.local_path))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
