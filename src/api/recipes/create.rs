use crate::api::{ErrorResponse, FieldErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::NewRecipe;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::payload::{
    check_references, replace_relations, unique_violation_message, validate, RecipeWritePayload,
};
use super::view::{load_recipe_views, RecipeView};

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeWritePayload,
    responses(
        (status = 201, description = "Recipe created", body = RecipeView),
        (status = 400, description = "Invalid payload", body = FieldErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(payload): Json<RecipeWritePayload>,
) -> impl IntoResponse {
    let errors = validate(&payload);
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(FieldErrorResponse { errors }))
            .into_response();
    }

    let mut conn = get_conn!(pool);

    let errors = match check_references(&mut conn, &payload) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to check payload references: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(FieldErrorResponse { errors }))
            .into_response();
    }

    // Recipe row and its join rows commit together or not at all
    let result: Result<Uuid, diesel::result::Error> = conn.transaction(|conn| {
        let new_recipe = NewRecipe {
            author_id: user.id,
            name: &payload.name,
            image: payload.image.as_deref(),
            text: &payload.text,
            cooking_time: payload.cooking_time,
        };

        let recipe_id: Uuid = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(recipes::id)
            .get_result(conn)?;

        replace_relations(conn, recipe_id, &payload)?;

        Ok(recipe_id)
    });

    let recipe_id = match result {
        Ok(id) => id,
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
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            _,
        )) => {
            // A referenced tag/ingredient vanished between check and insert
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Referenced tag or ingredient does not exist".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    let recipe = match recipes::table
        .find(recipe_id)
        .select(crate::models::Recipe::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to reload created recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match load_recipe_views(&mut conn, vec![recipe], Some(&user)) {
        Ok(mut views) if !views.is_empty() => {
            (StatusCode::CREATED, Json(views.remove(0))).into_response()
        }
        Ok(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Err(e) => {
            tracing::error!("Failed to build recipe view: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
