pub mod error;
mod extractors;
mod handlers;
mod routes;
mod state;

pub use extractors::SESSION_COOKIE;
pub use state::AppState;

use crate::{Config, Database};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Builds the full application router around `state`.
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs.max(1));

    Router::new()
        .merge(routes::blog_routes(state.max_upload_bytes))
        .merge(routes::auth_routes())
        .merge(routes::resource_routes())
        .merge(routes::health_routes())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = AppState::new(config, db)?;
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
