use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::dsl::sum;
use diesel::prelude::*;
use std::sync::Arc;

/// Render aggregated (name, unit, total) rows as the plain-text document.
/// One line per distinct ingredient; an empty cart renders an empty body.
fn format_shopping_list(rows: &[(String, String, i64)]) -> String {
    let mut out = String::new();
    for (name, unit, total) in rows {
        out.push_str(&format!("{} - {} {}\n", name, total, unit));
    }
    out
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list as a text attachment", body = String, content_type = "text/plain"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    // Grouped by ingredient id, not name: two same-named ingredients with
    // different units stay separate lines
    let rows: Vec<(String, String, Option<i64>)> = match recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(
            recipe_ingredients::recipe_id.eq_any(
                shopping_cart::table
                    .filter(shopping_cart::user_id.eq(user.id))
                    .select(shopping_cart::recipe_id),
            ),
        )
        .group_by((
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
        ))
        .order(ingredients::name.asc())
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            sum(recipe_ingredients::amount),
        ))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to aggregate shopping list: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let rows: Vec<(String, String, i64)> = rows
        .into_iter()
        .map(|(name, unit, total)| (name, unit, total.unwrap_or(0)))
        .collect();

    let body = format_shopping_list(&rows);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_cart() {
        assert_eq!(format_shopping_list(&[]), "");
    }

    #[test]
    fn test_format_summed_lines() {
        let rows = vec![
            ("Egg".to_string(), "pcs".to_string(), 2),
            ("Flour".to_string(), "g".to_string(), 300),
        ];
        assert_eq!(format_shopping_list(&rows), "Egg - 2 pcs\nFlour - 300 g\n");
    }

    #[test]
    fn test_format_same_name_different_units_stay_separate() {
        // Upstream grouping is by ingredient id, so two rows can share a name
        let rows = vec![
            ("Milk".to_string(), "l".to_string(), 1),
            ("Milk".to_string(), "ml".to_string(), 200),
        ];
        assert_eq!(format_shopping_list(&rows), "Milk - 1 l\nMilk - 200 ml\n");
    }
}
