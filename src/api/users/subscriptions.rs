use crate::api::recipes::ShortRecipeResponse;
use crate::api::{ErrorResponse, PageParams, PaginationMetadata};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{Recipe, User};
use crate::raw_sql::count_over;
use crate::schema::{follows, recipes, users};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::dsl::count;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Followed author with a capped preview of their recipes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Always true: this view only exists for followed authors
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeResponse>,
    /// Total recipe count for the author, independent of the preview cap
    pub recipes_count: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Authors per page (default: 6, max: 100)
    pub limit: Option<i64>,
    /// Cap on the number of recipes shown per author
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionView>,
    pub pagination: PaginationMetadata,
}

/// Normalize the caller-supplied preview cap: negative values mean an
/// empty preview, absence means the full recipe list.
fn preview_cap(recipes_limit: Option<i64>) -> Option<i64> {
    recipes_limit.map(|l| l.max(0))
}

/// Assemble subscription views for a set of followed authors.
///
/// Recipe counts come from one GROUP BY over the whole author set; the
/// previews are one capped query per author on the page, so the cap is
/// enforced in SQL and a prolific author never floods memory.
pub(super) fn load_subscription_views(
    conn: &mut PgConnection,
    authors: &[User],
    recipes_limit: Option<i64>,
) -> Result<Vec<SubscriptionView>, diesel::result::Error> {
    let author_ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();

    let counts: HashMap<Uuid, i64> = recipes::table
        .filter(recipes::author_id.eq_any(&author_ids))
        .group_by(recipes::author_id)
        .select((recipes::author_id, count(recipes::id)))
        .load::<(Uuid, i64)>(conn)?
        .into_iter()
        .collect();

    let cap = preview_cap(recipes_limit);

    let mut views = Vec::with_capacity(authors.len());
    for author in authors {
        let mut query = recipes::table
            .filter(recipes::author_id.eq(author.id))
            .order(recipes::pub_date.desc())
            .select(Recipe::as_select())
            .into_boxed();
        if let Some(cap) = cap {
            query = query.limit(cap);
        }
        let author_recipes: Vec<Recipe> = query.load(conn)?;

        views.push(SubscriptionView {
            id: author.id,
            email: author.email.clone(),
            username: author.username.clone(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            is_subscribed: true,
            recipes: author_recipes
                .into_iter()
                .map(ShortRecipeResponse::from)
                .collect(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
        });
    }
    Ok(views)
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Authors the caller follows", body = SubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> impl IntoResponse {
    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit, offset) = page_params.resolve();

    let mut conn = get_conn!(pool);

    let rows: Vec<(User, i64)> = match follows::table
        .inner_join(users::table.on(users::id.eq(follows::author_id)))
        .filter(follows::user_id.eq(user.id))
        .order(follows::created_at.desc())
        .select((User::as_select(), count_over()))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let authors: Vec<User> = rows.into_iter().map(|(author, _)| author).collect();

    let subscriptions =
        match load_subscription_views(&mut conn, &authors, params.recipes_limit) {
            Ok(views) => views,
            Err(e) => {
                tracing::error!("Failed to build subscription views: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch subscriptions".to_string(),
                    }),
                )
                    .into_response();
            }
        };

    (
        StatusCode::OK,
        Json(SubscriptionsResponse {
            subscriptions,
            pagination: PaginationMetadata { count, page, limit },
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cap_absent_means_uncapped() {
        assert_eq!(preview_cap(None), None);
    }

    #[test]
    fn test_preview_cap_passes_positive_values() {
        assert_eq!(preview_cap(Some(3)), Some(3));
        assert_eq!(preview_cap(Some(0)), Some(0));
    }

    #[test]
    fn test_preview_cap_clamps_negative_to_empty() {
        assert_eq!(preview_cap(Some(-2)), Some(0));
    }
}
