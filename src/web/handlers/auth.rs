use crate::models::User;
use crate::services::auth;
use crate::web::error::{ApiError, ApiResult, Envelope};
use crate::web::extractors::{CurrentUser, SESSION_COOKIE};
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> ApiResult<(CookieJar, Envelope<User>)> {
    let user = auth::authenticate(&state.db, form.username.trim(), &form.password)?
        .ok_or(ApiError::Unauthorized)?;

    let token = auth::create_session(&state.db, user.id, state.session_lifetime_hours)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        jar.add(cookie),
        Envelope::ok(StatusCode::OK, Some("Logged in"), user),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Envelope<()>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        auth::delete_session(&state.db, cookie.value())?;
    }

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Envelope::ok(StatusCode::OK, Some("Logged out"), ()),
    ))
}

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Envelope<User> {
    Envelope::ok(StatusCode::OK, None, user)
}
