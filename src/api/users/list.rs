use crate::api::{ErrorResponse, PageParams, PaginationMetadata};
use crate::auth::MaybeAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::raw_sql::count_over;
use crate::schema::{follows, users};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserProfile;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsersListResponse {
    pub users: Vec<UserProfile>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of users", body = UsersListResponse)
    )
)]
pub async fn list_users(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let (page, limit, offset) = params.resolve();

    let mut conn = get_conn!(pool);

    let rows: Vec<(User, i64)> = match users::table
        .order(users::username.asc())
        .select((User::as_select(), count_over()))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);

    // One query for all "do I follow them" flags on this page
    let subscribed: HashSet<Uuid> = match &viewer {
        Some(viewer) => {
            let ids: Vec<Uuid> = rows.iter().map(|(u, _)| u.id).collect();
            match follows::table
                .filter(follows::user_id.eq(viewer.id))
                .filter(follows::author_id.eq_any(&ids))
                .select(follows::author_id)
                .load::<Uuid>(&mut conn)
            {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::error!("Failed to fetch subscriptions: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: "Failed to fetch users".to_string(),
                        }),
                    )
                        .into_response();
                }
            }
        }
        None => HashSet::new(),
    };

    let users = rows
        .into_iter()
        .map(|(user, _)| {
            let is_subscribed = subscribed.contains(&user.id);
            UserProfile::from_user(&user, is_subscribed)
        })
        .collect();

    (
        StatusCode::OK,
        Json(UsersListResponse {
            users,
            pagination: PaginationMetadata { count, page, limit },
        }),
    )
        .into_response()
}
