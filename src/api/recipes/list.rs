use crate::api::{ErrorResponse, PageParams, PaginationMetadata};
use crate::auth::MaybeAuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::raw_sql::count_over;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart, tags};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::view::{load_recipe_views, RecipeView};

/// Parsed recipe list filters. The `tags` key repeats, so parameters are
/// taken as raw pairs rather than a flat struct.
#[derive(Debug, Default, PartialEq)]
struct ListRecipesParams {
    page: Option<i64>,
    limit: Option<i64>,
    author: Option<Uuid>,
    tags: Vec<String>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("Invalid boolean value: {other}")),
    }
}

fn parse_list_params(pairs: &[(String, String)]) -> Result<ListRecipesParams, String> {
    let mut params = ListRecipesParams::default();

    for (key, value) in pairs {
        match key.as_str() {
            "page" => {
                params.page =
                    Some(value.parse().map_err(|_| "Invalid page number".to_string())?);
            }
            "limit" => {
                params.limit =
                    Some(value.parse().map_err(|_| "Invalid limit".to_string())?);
            }
            "author" => {
                params.author = Some(
                    value
                        .parse()
                        .map_err(|_| "Invalid author id".to_string())?,
                );
            }
            "tags" => {
                if !value.is_empty() {
                    params.tags.push(value.clone());
                }
            }
            "is_favorited" => params.is_favorited = parse_flag(value)?,
            "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(value)?,
            // Unknown keys are ignored
            _ => {}
        }
    }

    Ok(params)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipesListResponse {
    pub recipes: Vec<RecipeView>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default: 6, max: 100)"),
        ("author" = Option<Uuid>, Query, description = "Only recipes by this author"),
        ("tags" = Option<String>, Query, description = "Tag slug; repeat the key for OR semantics"),
        ("is_favorited" = Option<String>, Query, description = "1/true: only the caller's favorites (no-op for anonymous)"),
        ("is_in_shopping_cart" = Option<String>, Query, description = "1/true: only recipes in the caller's cart (no-op for anonymous)"),
    ),
    responses(
        (status = 200, description = "Paginated recipes, newest first", body = RecipesListResponse),
        (status = 400, description = "Invalid filter parameter", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let params = match parse_list_params(&pairs) {
        Ok(p) => p,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
    };

    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit, offset) = page_params.resolve();

    let mut conn = get_conn!(pool);

    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    // OR semantics: any of the given slugs matches
    if !params.tags.is_empty() {
        query = query.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(params.tags.clone()))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    // Relationship filters only apply to authenticated callers; for
    // anonymous callers the flags are always false, so the filter is a no-op
    if let Some(viewer) = &viewer {
        if params.is_favorited {
            query = query.filter(
                recipes::id.eq_any(
                    favorites::table
                        .filter(favorites::user_id.eq(viewer.id))
                        .select(favorites::recipe_id),
                ),
            );
        }
        if params.is_in_shopping_cart {
            query = query.filter(
                recipes::id.eq_any(
                    shopping_cart::table
                        .filter(shopping_cart::user_id.eq(viewer.id))
                        .select(shopping_cart::recipe_id),
                ),
            );
        }
    }

    let rows: Vec<(Recipe, i64)> = match query
        .order(recipes::pub_date.desc())
        .select((Recipe::as_select(), count_over()))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let count = rows.first().map(|(_, total)| *total).unwrap_or(0);
    let recipe_rows: Vec<Recipe> = rows.into_iter().map(|(recipe, _)| recipe).collect();

    let recipes = match load_recipe_views(&mut conn, recipe_rows, viewer.as_ref()) {
        Ok(views) => views,
        Err(e) => {
            tracing::error!("Failed to build recipe views: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(RecipesListResponse {
            recipes,
            pagination: PaginationMetadata { count, page, limit },
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_empty() {
        let params = parse_list_params(&[]).unwrap();
        assert_eq!(params, ListRecipesParams::default());
    }

    #[test]
    fn test_parse_repeated_tags() {
        let params =
            parse_list_params(&pairs(&[("tags", "breakfast"), ("tags", "dinner")])).unwrap();
        assert_eq!(params.tags, vec!["breakfast", "dinner"]);
    }

    #[test]
    fn test_parse_author_and_flags() {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let params = parse_list_params(&pairs(&[
            ("author", &id_str),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "true"),
        ]))
        .unwrap();
        assert_eq!(params.author, Some(id));
        assert!(params.is_favorited);
        assert!(params.is_in_shopping_cart);
    }

    #[test]
    fn test_parse_bad_author_rejected() {
        assert!(parse_list_params(&pairs(&[("author", "not-a-uuid")])).is_err());
    }

    #[test]
    fn test_parse_bad_flag_rejected() {
        assert!(parse_list_params(&pairs(&[("is_favorited", "yes")])).is_err());
    }

    #[test]
    fn test_parse_unknown_keys_ignored() {
        let params = parse_list_params(&pairs(&[("sort", "name"), ("page", "2")])).unwrap();
        assert_eq!(params.page, Some(2));
    }

    #[test]
    fn test_parse_empty_tag_value_skipped() {
        let params = parse_list_params(&pairs(&[("tags", "")])).unwrap();
        assert!(params.tags.is_empty());
    }
}
