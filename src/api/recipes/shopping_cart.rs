use crate::api::toggle::{classify_attach, classify_detach, AttachOutcome, DetachOutcome};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewCartEntry, Recipe};
use crate::schema::{recipes, shopping_cart};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::ShortRecipeResponse;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to shopping cart", body = ShortRecipeResponse),
        (status = 400, description = "Already in shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let recipe: Option<Recipe> = match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
        .optional()
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to add to shopping cart".to_string(),
                }),
            )
                .into_response();
        }
    };

    let recipe = match recipe {
        Some(r) => r,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
    };

    let new_entry = NewCartEntry {
        user_id: user.id,
        recipe_id: recipe.id,
    };
    let result = diesel::insert_into(shopping_cart::table)
        .values(&new_entry)
        .execute(&mut conn);
    match classify_attach(result) {
        AttachOutcome::Created => {
            (StatusCode::CREATED, Json(ShortRecipeResponse::from(recipe))).into_response()
        }
        AttachOutcome::AlreadyPresent => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Recipe is already in your shopping cart".to_string(),
            }),
        )
            .into_response(),
        AttachOutcome::Failed(e) => {
            tracing::error!("Failed to add to shopping cart: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to add to shopping cart".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from shopping cart"),
        (status = 400, description = "Not in shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let result = diesel::delete(
        shopping_cart::table
            .filter(shopping_cart::user_id.eq(user.id))
            .filter(shopping_cart::recipe_id.eq(id)),
    )
    .execute(&mut conn);
    match classify_detach(result) {
        DetachOutcome::Removed => StatusCode::NO_CONTENT.into_response(),
        DetachOutcome::NotPresent => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Recipe is not in your shopping cart".to_string(),
            }),
        )
            .into_response(),
        DetachOutcome::Failed(e) => {
            tracing::error!("Failed to remove from shopping cart: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to remove from shopping cart".to_string(),
                }),
            )
                .into_response()
        }
    }
}
