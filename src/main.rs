//! RateMyBite Backend
//!
//! REST backend for restaurant listings, star reviews, moderation and ownership claims,
//! with SQLite persistence and address geocoding.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod geocoding;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{RoleSet, TokenService};
use config::Config;
use db::Repository;
use geocoding::{Geocoder, NominatimGeocoder};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub geocoder: Arc<dyn Geocoder>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting RateMyBite Backend");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Geocoder: {}", config.geocoder_url);
    tracing::info!(
        "Review moderation: {}",
        if config.review_moderation { "enabled" } else { "disabled" }
    );

    // Initialize database; the process exits non-zero if this fails
    let pool = db::init_database(&config.database_url).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(admin) = &config.admin {
        db::bootstrap_admin(&repo, admin).await?;
    }
    if config.seed_demo {
        db::seed_demo_restaurants(&repo).await?;
    }

    let geocoder = NominatimGeocoder::new(config.geocoder_url.clone(), config.geocoder_timeout)?;

    // Create application state
    let state = AppState {
        repo: repo.clone(),
        geocoder: Arc::new(geocoder),
        tokens: Arc::new(TokenService::new(&config.jwt_secret)),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    tracing::info!("Shut down");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Anyone
    let public_routes = Router::new()
        .route("/restaurants", get(api::list_restaurants))
        .route("/restaurants/{id}", get(api::get_restaurant))
        .route(
            "/reviews/restaurant/{id}",
            get(api::list_reviews_for_restaurant),
        )
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login));

    // Any signed-in user
    let member_routes = Router::new()
        .route("/auth/me", get(api::current_user))
        .route("/reviews/mine", get(api::list_my_reviews))
        .route("/reviews/restaurant/{id}", post(api::create_review))
        .route("/restaurants/{id}/claims", post(api::submit_claim))
        .route_layer(middleware::from_fn(|req, next| {
            auth::authorize(RoleSet::MEMBERS, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    // Administrators
    let admin_routes = Router::new()
        // Restaurants
        .route("/restaurants", post(api::create_restaurant))
        .route("/restaurants/{id}", put(api::update_restaurant))
        .route("/restaurants/{id}", delete(api::delete_restaurant))
        // Review moderation
        .route("/admin/reviews/pending", get(api::list_pending_reviews))
        .route("/admin/reviews/{id}/approve", patch(api::approve_review))
        .route("/admin/reviews/{id}", delete(api::remove_review))
        // Categories
        .route("/admin/categories", get(api::list_categories))
        .route("/admin/categories", post(api::create_category))
        .route("/admin/categories/{id}", get(api::get_category))
        .route("/admin/categories/{id}", put(api::update_category))
        .route("/admin/categories/{id}", delete(api::delete_category))
        // Claims
        .route("/admin/claims/pending", get(api::list_pending_claims))
        .route("/admin/claims/{id}/approve", patch(api::approve_claim))
        .route_layer(middleware::from_fn(|req, next| {
            auth::authorize(RoleSet::ADMINS, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    let api_routes = public_routes.merge(member_routes).merge(admin_routes);

    // Operational routes (no auth required)
    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "RateMyBite API is running"
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
