use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

// Headroom on top of the image itself for the text fields of the form.
const FORM_OVERHEAD: usize = 1024 * 1024;

pub fn blog_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/blog", axum::routing::delete(handlers::blog::delete_post))
        .route("/api/blog/list", get(handlers::blog::list_posts))
        .route(
            "/api/blog/upsert",
            post(handlers::blog::upsert_post)
                .layer(DefaultBodyLimit::max(max_upload_bytes + FORM_OVERHEAD)),
        )
        .route("/api/blog/:param", get(handlers::blog::get_post))
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
}

pub fn resource_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/resources", get(handlers::resources::serve_resource))
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(|| async { "ok" }))
}
