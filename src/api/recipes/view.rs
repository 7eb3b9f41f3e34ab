use crate::api::tags::TagResponse;
use crate::api::users::UserProfile;
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{
    favorites, follows, ingredients, recipe_ingredients, recipe_tags, shopping_cart, tags, users,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

/// Nested read view of a recipe: embedded author profile, tags and
/// ingredient lines, plus the caller-dependent favorite/cart flags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<TagResponse>,
    pub author: UserProfile,
    pub ingredients: Vec<IngredientLine>,
    /// Whether the caller has favorited this recipe (false for anonymous)
    pub is_favorited: bool,
    /// Whether this recipe is in the caller's cart (false for anonymous)
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// One ingredient of a recipe with its per-recipe amount.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientLine {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Assemble nested views for a page of recipes with a fixed number of
/// queries: authors, tags, ingredient lines, and the three per-viewer
/// relationship sets are each one batched load.
pub fn load_recipe_views(
    conn: &mut PgConnection,
    recipe_rows: Vec<Recipe>,
    viewer: Option<&User>,
) -> Result<Vec<RecipeView>, diesel::result::Error> {
    if recipe_rows.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipe_rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = {
        let set: HashSet<Uuid> = recipe_rows.iter().map(|r| r.author_id).collect();
        set.into_iter().collect()
    };

    let authors: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut lines_by_recipe: HashMap<Uuid, Vec<(Ingredient, i32)>> = HashMap::new();
    let line_rows: Vec<(Uuid, i32, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::amount,
            Ingredient::as_select(),
        ))
        .load(conn)?;
    for (recipe_id, amount, ingredient) in line_rows {
        lines_by_recipe
            .entry(recipe_id)
            .or_default()
            .push((ingredient, amount));
    }

    let (favorited, in_cart, followed) = match viewer {
        Some(viewer) => {
            let favorited: HashSet<Uuid> = favorites::table
                .filter(favorites::user_id.eq(viewer.id))
                .filter(favorites::recipe_id.eq_any(&recipe_ids))
                .select(favorites::recipe_id)
                .load::<Uuid>(conn)?
                .into_iter()
                .collect();
            let in_cart: HashSet<Uuid> = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer.id))
                .filter(shopping_cart::recipe_id.eq_any(&recipe_ids))
                .select(shopping_cart::recipe_id)
                .load::<Uuid>(conn)?
                .into_iter()
                .collect();
            let followed: HashSet<Uuid> = follows::table
                .filter(follows::user_id.eq(viewer.id))
                .filter(follows::author_id.eq_any(&author_ids))
                .select(follows::author_id)
                .load::<Uuid>(conn)?
                .into_iter()
                .collect();
            (favorited, in_cart, followed)
        }
        None => (HashSet::new(), HashSet::new(), HashSet::new()),
    };

    let mut views = Vec::with_capacity(recipe_rows.len());
    for recipe in recipe_rows {
        let author = match authors.get(&recipe.author_id) {
            Some(a) => a,
            None => {
                // FK guarantees an author; tolerate a concurrent delete
                tracing::warn!("Recipe {} has no author row, skipping", recipe.id);
                continue;
            }
        };

        views.push(RecipeView {
            id: recipe.id,
            tags: tags_by_recipe
                .remove(&recipe.id)
                .unwrap_or_default()
                .into_iter()
                .map(TagResponse::from)
                .collect(),
            author: UserProfile::from_user(author, followed.contains(&author.id)),
            ingredients: lines_by_recipe
                .remove(&recipe.id)
                .unwrap_or_default()
                .into_iter()
                .map(|(ingredient, amount)| IngredientLine {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount,
                })
                .collect(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            pub_date: recipe.pub_date,
        });
    }

    Ok(views)
}
