use crate::auth::AuthUser;
use axum::{http::StatusCode, response::IntoResponse, Json};

use super::UserProfile;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = UserProfile),
        (status = 401, description = "Unauthorized", body = crate::api::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    // A user never follows themselves, so the flag is always false here
    (StatusCode::OK, Json(UserProfile::from_user(&user, false))).into_response()
}
