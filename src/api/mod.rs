pub mod auth;
mod cid;
mod error;
mod members;
mod system;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/logout", post(auth::logout));

    // Identity verification stub (public)
    let cid_routes = Router::new()
        .route("/verify", get(cid::verify_info))
        .route("/verify", post(cid::verify_cid));

    // Protected member directory routes
    let member_routes = Router::new()
        .route("/members", get(members::list_members))
        .route("/members", post(members::create_member))
        .route("/members/stats", get(members::member_stats))
        .route("/members/:id", get(members::get_member))
        .route("/members/:id", put(members::update_member))
        .route("/members/:id", delete(members::delete_member))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(system::index))
        .route("/api/health", get(system::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/cid", cid_routes)
        .nest("/api", member_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
