//! Axum router configuration with middleware.
//!
//! Routes live under `/api/`. Middleware, outermost first: tracing, CORS,
//! then the session gate from [`crate::http::session`].

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::session::require_session;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Agent CRUD
        .route(
            "/agents",
            get(handlers::agents::list_agents)
                .post(handlers::agents::create_agent)
                .put(handlers::agents::update_agent)
                .delete(handlers::agents::delete_agent),
        )
        // Builder chat
        .route("/chat", post(handlers::chat::chat))
        // Deployments
        .route("/deploy/create", post(handlers::deploy::create_deployment))
        .route(
            "/deploy/{id}",
            get(handlers::deploy::deployment_status)
                .post(handlers::deploy::invoke_deployment)
                .patch(handlers::deploy::toggle_deployment)
                .delete(handlers::deploy::delete_deployment),
        )
        // Sessions
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(from_fn_with_state(state.clone(), require_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
