use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::models::User;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;

use super::db::get_user_from_token;
use super::middleware::bearer_token;

/// Extractor for the authenticated user. Rejects with 401 when the
/// Authorization header is missing or the token is invalid.
pub struct AuthUser(pub User);

/// Extractor for endpoints that serve anonymous callers too. Yields
/// `None` instead of rejecting when no valid token is presented.
pub struct MaybeAuthUser(pub Option<User>);

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Authentication required".to_string(),
        }),
    )
        .into_response()
}

impl FromRequestParts<Arc<DbPool>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        pool: &Arc<DbPool>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(unauthorized)?;
        match get_user_from_token(pool, token).await {
            Some(user) => Ok(AuthUser(user)),
            None => Err(unauthorized()),
        }
    }
}

impl FromRequestParts<Arc<DbPool>> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        pool: &Arc<DbPool>,
    ) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(&parts.headers) {
            Some(token) => get_user_from_token(pool, token).await,
            None => None,
        };
        Ok(MaybeAuthUser(user))
    }
}
