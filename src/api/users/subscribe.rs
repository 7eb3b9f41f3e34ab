use crate::api::toggle::{classify_attach, classify_detach, AttachOutcome, DetachOutcome};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewFollow, User};
use crate::schema::{follows, users};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use super::subscriptions::{load_subscription_views, SubscriptionView};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscribeParams {
    /// Cap on the number of recipes shown in the response
    pub recipes_limit: Option<i64>,
}

/// Self-follow is rejected on both verbs, before the author lookup and
/// regardless of whether a follow row exists.
fn is_self_follow(user_id: Uuid, author_id: Uuid) -> bool {
    user_id == author_id
}

fn load_author(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, diesel::result::Error> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author to follow"),
        SubscribeParams,
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionView),
        (status = 400, description = "Self-follow or already subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Query(params): Query<SubscribeParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if is_self_follow(user.id, id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "You cannot subscribe to yourself".to_string(),
            }),
        )
            .into_response();
    }

    let author = match load_author(&mut conn, id) {
        Ok(Some(a)) => a,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Author not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch author: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch author".to_string(),
                }),
            )
                .into_response();
        }
    };

    // The pk on (user_id, author_id) is the real duplicate guard; the
    // unique-violation arm catches a racing second subscribe.
    let new_follow = NewFollow {
        user_id: user.id,
        author_id: author.id,
    };
    let result = diesel::insert_into(follows::table)
        .values(&new_follow)
        .execute(&mut conn);
    match classify_attach(result) {
        AttachOutcome::Created => {}
        AttachOutcome::AlreadyPresent => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "You are already subscribed to this author".to_string(),
                }),
            )
                .into_response()
        }
        AttachOutcome::Failed(e) => {
            tracing::error!("Failed to create subscription: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to subscribe".to_string(),
                }),
            )
                .into_response();
        }
    }

    let views =
        match load_subscription_views(&mut conn, std::slice::from_ref(&author), params.recipes_limit)
        {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Failed to build subscription view: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to subscribe".to_string(),
                    }),
                )
                    .into_response();
            }
        };
    let view = views.into_iter().next();

    match view {
        Some(view) => (StatusCode::CREATED, Json(view)).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author to unfollow")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Self-follow or not subscribed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if is_self_follow(user.id, id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "You cannot unsubscribe from yourself".to_string(),
            }),
        )
            .into_response();
    }

    match load_author(&mut conn, id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Author not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch author: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch author".to_string(),
                }),
            )
                .into_response();
        }
    }

    let result = diesel::delete(
        follows::table
            .filter(follows::user_id.eq(user.id))
            .filter(follows::author_id.eq(id)),
    )
    .execute(&mut conn);
    match classify_detach(result) {
        DetachOutcome::Removed => StatusCode::NO_CONTENT.into_response(),
        DetachOutcome::NotPresent => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "You are not subscribed to this author".to_string(),
            }),
        )
            .into_response(),
        DetachOutcome::Failed(e) => {
            tracing::error!("Failed to delete subscription: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to unsubscribe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_follow_rejected_for_own_id() {
        let id = Uuid::new_v4();
        assert!(is_self_follow(id, id));
    }

    #[test]
    fn test_follow_of_another_author_allowed() {
        assert!(!is_self_follow(Uuid::new_v4(), Uuid::new_v4()));
    }
}
