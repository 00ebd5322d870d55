use crate::models::User;
use crate::services::auth;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// The user behind the request's session cookie. Rejects with 401 when the
/// cookie is missing, unknown or expired.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(ApiError::Unauthorized)?;

            let user = auth::validate_session(&state.db, &token)
                .map_err(|e| ApiError::internal("Session lookup failed", e))?
                .ok_or(ApiError::Unauthorized)?;

            Ok(CurrentUser(user))
        })
    }
}
