//! Tractor-Mower Marketplace Backend
//!
//! REST backend for a classified-ads marketplace with SQLite persistence and
//! Tantivy full-text search.

mod api;
mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod forms;
mod models;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tractor-Mower Marketplace Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (MOWER_API_PSK). Admin routes are open!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));
    tracing::info!("Database ready with {} listings", repo.count_listings().await?);

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // The index is derived data; rebuild it from the store on every start.
    tracing::info!("Building search index...");
    let listings = repo.list_listings().await?;
    search.rebuild(&listings).await?;

    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    let public_routes = Router::new()
        // Listings
        .route("/listings", get(api::list_listings).post(api::create_listing))
        .route("/listings/recent", get(api::recent_listings))
        .route("/listings/featured", get(api::featured_listings))
        .route("/listings/wizard", get(api::wizard_steps))
        .route("/listings/wizard/{step}", post(api::validate_wizard_step))
        .route("/listings/{id}", get(api::get_listing))
        .route("/listings/{id}/gallery", get(api::listing_gallery))
        // Search
        .route("/search", get(api::search_listings))
        // Brands
        .route("/brands", get(api::list_brands))
        .route("/brands/{id}", get(api::get_brand))
        // Messages
        .route("/messages", post(api::send_message))
        // Saved listings
        .route(
            "/saved/{owner}",
            get(api::list_saved).delete(api::clear_saved),
        )
        .route(
            "/saved/{owner}/{listing_id}",
            put(api::save_listing).delete(api::unsave_listing),
        )
        // Stats
        .route("/stats", get(api::market_stats));

    let admin_routes = Router::new()
        .route(
            "/listings/{id}",
            put(api::update_listing).delete(api::delete_listing),
        )
        .route("/brands", post(api::create_brand))
        .route(
            "/brands/{id}",
            put(api::update_brand).delete(api::delete_brand),
        )
        .route("/messages", get(api::list_messages))
        .route(
            "/messages/{id}",
            get(api::get_message).delete(api::delete_message),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
