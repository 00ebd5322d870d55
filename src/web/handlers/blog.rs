use crate::models::{split_tags, BlogPost, ImageUpload, PostPage, UpsertOutcome, UpsertPost, User, UserRole};
use crate::services::blog;
use crate::services::listing::{self, ListQuery};
use crate::web::error::{ApiError, ApiResult, Envelope};
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;

fn require_admin(user: &User) -> ApiResult<()> {
    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

fn require_author_or_admin(user: &User) -> ApiResult<()> {
    if !user.role.can_write_posts() {
        return Err(ApiError::Forbidden(
            "Author or admin access required".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/blog/:param
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(param): Path<String>,
) -> ApiResult<Envelope<BlogPost>> {
    let post = blog::get_post(&state.db, &param)?;
    Ok(Envelope::ok(StatusCode::OK, None, post))
}

/// GET /api/blog/list
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Envelope<PostPage>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let api = &state.config.api;
    let page = listing::list_posts(&state.db, &query, api.default_page_size, api.max_page_size)?;
    Ok(Envelope::ok(StatusCode::OK, None, page))
}

#[derive(Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// DELETE /api/blog?id=
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Envelope<BlogPost>> {
    require_admin(&user)?;

    let raw = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Blog ID is required".to_string()))?;
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid blog ID: {}", raw)))?;

    let deleted = blog::delete_post(&state.db, &state.resources, id)?;
    Ok(Envelope::ok(
        StatusCode::OK,
        Some("Blog successfully deleted"),
        deleted,
    ))
}

fn parse_id_field(name: &str, value: &str) -> ApiResult<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", name, value)))
}

async fn read_upsert_form(mut multipart: Multipart) -> ApiResult<UpsertPost> {
    let mut input = UpsertPost::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "featureImage" {
            // A plain text value here is the currently stored path echoed back
            // by the form; only an actual file counts as a new image.
            let Some(file_name) = field.file_name().map(str::to_string) else {
                continue;
            };
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            input.feature_image = Some(ImageUpload {
                file_name,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        match name.as_str() {
            "id" => input.id = parse_id_field("id", &value)?,
            "userId" => input.user_id = parse_id_field("userId", &value)?,
            "title" => input.title = Some(value),
            "content" => input.content = Some(value),
            "state" => input.state = Some(value),
            "tags" => input.tags = Some(split_tags(&value)),
            other => tracing::debug!(field = other, "Ignoring unknown upsert field"),
        }
    }

    Ok(input)
}

/// POST /api/blog/upsert
pub async fn upsert_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> ApiResult<Envelope<BlogPost>> {
    require_author_or_admin(&user)?;

    let input = read_upsert_form(multipart).await?;
    let outcome = blog::upsert_post(
        &state.db,
        &state.resources,
        &user,
        input,
        state.config.content.max_content_length,
    )?;

    let envelope = match outcome {
        UpsertOutcome::Created(post) => {
            Envelope::ok(StatusCode::CREATED, Some("Blog created successfully"), post)
        }
        UpsertOutcome::Updated(post) => {
            Envelope::ok(StatusCode::OK, Some("Blog updated successfully"), post)
        }
    };
    Ok(envelope)
}
