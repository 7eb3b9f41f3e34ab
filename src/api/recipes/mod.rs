pub mod create;
pub mod delete;
pub mod download_shopping_cart;
pub mod favorite;
pub mod get;
pub mod list;
pub mod payload;
pub mod shopping_cart;
pub mod update;
pub mod view;

use crate::models::Recipe;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/recipes CRUD. Reads serve anonymous
/// callers; the write handlers reject them via the AuthUser extractor.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipes",
            get(list::list_recipes).post(create::create_recipe),
        )
        .route(
            "/api/recipes/{id}",
            get(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

/// Returns the router for recipe endpoints that always require auth
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipes/download_shopping_cart",
            get(download_shopping_cart::download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/favorite",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart",
            post(shopping_cart::add_to_cart).delete(shopping_cart::remove_from_cart),
        )
}

/// Compact recipe view used by favorite/cart responses and author previews.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortRecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<Recipe> for ShortRecipeResponse {
    fn from(recipe: Recipe) -> Self {
        ShortRecipeResponse {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        get::get_recipe,
        create::create_recipe,
        update::update_recipe,
        delete::delete_recipe,
        favorite::add_favorite,
        favorite::remove_favorite,
        shopping_cart::add_to_cart,
        shopping_cart::remove_from_cart,
        download_shopping_cart::download_shopping_cart,
    ),
    components(schemas(
        ShortRecipeResponse,
        view::RecipeView,
        view::IngredientLine,
        list::RecipesListResponse,
        payload::RecipeWritePayload,
        payload::IngredientAmountPayload,
    ))
)]
pub struct ApiDoc;
