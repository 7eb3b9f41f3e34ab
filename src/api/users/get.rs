use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::schema::{follows, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::dsl::exists;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::UserProfile;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = UserProfile),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let user: Option<User> = match users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)
        .optional()
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let user = match user {
        Some(u) => u,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User not found".to_string(),
                }),
            )
                .into_response()
        }
    };

    let is_subscribed = match &viewer {
        Some(viewer) => match diesel::select(exists(
            follows::table
                .filter(follows::user_id.eq(viewer.id))
                .filter(follows::author_id.eq(user.id)),
        ))
        .get_result::<bool>(&mut conn)
        {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("Failed to check subscription: {}", e);
                false
            }
        },
        None => false,
    };

    (
        StatusCode::OK,
        Json(UserProfile::from_user(&user, is_subscribed)),
    )
        .into_response()
}
