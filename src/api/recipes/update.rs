use crate::api::{ErrorResponse, FieldErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::recipes;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::payload::{
    check_references, replace_relations, unique_violation_message, validate, RecipeWritePayload,
};
use super::view::{load_recipe_views, RecipeView};

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeWritePayload,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeView),
        (status = 400, description = "Invalid payload", body = FieldErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author or an admin", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeWritePayload>,
) -> impl IntoResponse {
    let errors = validate(&payload);
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(FieldErrorResponse { errors }))
            .into_response();
    }

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
                    error: "Failed to update recipe".to_string(),
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

    if recipe.author_id != user.id && !user.is_admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the author or an admin can modify this recipe".to_string(),
            }),
        )
            .into_response();
    }

    let errors = match check_references(&mut conn, &payload) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to check payload references: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(FieldErrorResponse { errors }))
            .into_response();
    }

    // Scalar fields and the full tag/ingredient replace commit together
    let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
        diesel::update(recipes::table.find(recipe.id))
            .set((
                recipes::name.eq(&payload.name),
                recipes::image.eq(payload.image.as_deref()),
                recipes::text.eq(&payload.text),
                recipes::cooking_time.eq(payload.cooking_time),
            ))
            .execute(conn)?;

        replace_relations(conn, recipe.id, &payload)?;

        Ok(())
    });

    match result {
        Ok(()) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: unique_violation_message(info.as_ref()).to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    let updated = match recipes::table
        .find(recipe.id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to reload updated recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match load_recipe_views(&mut conn, vec![updated], Some(&user)) {
        Ok(mut views) if !views.is_empty() => {
            (StatusCode::OK, Json(views.remove(0))).into_response()
        }
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(e) => {
            tracing::error!("Failed to build recipe view: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
