use crate::services::image::{self, TranscodeOptions};
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ResourceParams {
    pub resource: Option<String>,
    pub w: Option<i64>,
    pub h: Option<i64>,
    pub q: Option<i64>,
}

/// GET /api/resources?resource=&w=&h=&q=
///
/// Serves a stored file. Images are resized and re-encoded when any of the
/// sizing or quality parameters is present.
pub async fn serve_resource(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResourceParams>,
) -> ApiResult<Response> {
    let resource = params
        .resource
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("resource is required".to_string()))?;

    let path = state
        .resources
        .resolve(&resource)
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;

    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal("Error retrieving resource", e))?;

    let mime_type = infer::get(&data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| {
            mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string()
        });

    let wants_transcode = params.w.is_some() || params.h.is_some() || params.q.is_some();
    if wants_transcode && image::is_transcodable(&mime_type) {
        let options = TranscodeOptions::from_query(params.w, params.h, params.q);
        let output = tokio::task::spawn_blocking(move || image::transcode(&data, options))
            .await
            .map_err(|e| ApiError::internal("Error retrieving resource", e))?
            .map_err(|e| ApiError::internal("Error retrieving resource", e))?;

        return Ok(([(header::CONTENT_TYPE, output.mime_type)], output.data).into_response());
    }

    Ok(([(header::CONTENT_TYPE, mime_type)], data).into_response())
}
