use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, tags};
use diesel::prelude::*;
use diesel::result::DatabaseErrorInformation;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

/// Flat write representation: scalar fields plus tag ids and
/// (ingredient id, amount) pairs. Responses always use the nested
/// read view, never this shape.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeWritePayload {
    pub name: String,
    /// Image URL; upload handling is out of scope
    pub image: Option<String>,
    pub text: String,
    /// Minutes, must be at least 1
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmountPayload>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmountPayload {
    pub id: Uuid,
    /// Must be at least 1
    pub amount: i32,
}

/// Structural validation, run before touching the database.
/// Returns one message per offending field; empty map means valid.
pub fn validate(payload: &RecipeWritePayload) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    if payload.name.trim().is_empty() {
        errors.insert("name".to_string(), "Name cannot be empty".to_string());
    }
    if payload.text.trim().is_empty() {
        errors.insert("text".to_string(), "Text cannot be empty".to_string());
    }
    if payload.cooking_time < 1 {
        errors.insert(
            "cooking_time".to_string(),
            "Cooking time must be at least 1".to_string(),
        );
    }

    if payload.tags.is_empty() {
        errors.insert("tags".to_string(), "At least one tag is required".to_string());
    } else {
        let unique: HashSet<&Uuid> = payload.tags.iter().collect();
        if unique.len() != payload.tags.len() {
            errors.insert("tags".to_string(), "Tags must not repeat".to_string());
        }
    }

    if payload.ingredients.is_empty() {
        errors.insert(
            "ingredients".to_string(),
            "At least one ingredient is required".to_string(),
        );
    } else {
        let unique: HashSet<&Uuid> = payload.ingredients.iter().map(|i| &i.id).collect();
        if unique.len() != payload.ingredients.len() {
            errors.insert(
                "ingredients".to_string(),
                "Ingredients must not repeat".to_string(),
            );
        } else if payload.ingredients.iter().any(|i| i.amount < 1) {
            errors.insert(
                "ingredients".to_string(),
                "Ingredient amount must be at least 1".to_string(),
            );
        }
    }

    errors
}

/// Verify every referenced tag and ingredient id exists. Field errors
/// for dangling ids; the FK constraints remain the backstop for races.
pub fn check_references(
    conn: &mut PgConnection,
    payload: &RecipeWritePayload,
) -> Result<BTreeMap<String, String>, diesel::result::Error> {
    let mut errors = BTreeMap::new();

    let known_tags: HashSet<Uuid> = tags::table
        .filter(tags::id.eq_any(&payload.tags))
        .select(tags::id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();
    if payload.tags.iter().any(|id| !known_tags.contains(id)) {
        errors.insert("tags".to_string(), "Unknown tag id".to_string());
    }

    let wanted: Vec<Uuid> = payload.ingredients.iter().map(|i| i.id).collect();
    let known_ingredients: HashSet<Uuid> = ingredients::table
        .filter(ingredients::id.eq_any(&wanted))
        .select(ingredients::id)
        .load::<Uuid>(conn)?
        .into_iter()
        .collect();
    if wanted.iter().any(|id| !known_ingredients.contains(id)) {
        errors.insert(
            "ingredients".to_string(),
            "Unknown ingredient id".to_string(),
        );
    }

    Ok(errors)
}

/// Full-replace of a recipe's tag set and ingredient set. The write
/// contract is replace, not merge: callers resend the complete lists.
/// Must run inside the caller's transaction.
pub fn replace_relations(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    payload: &RecipeWritePayload,
) -> Result<(), diesel::result::Error> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;

    let tag_rows: Vec<NewRecipeTag> = payload
        .tags
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&tag_rows)
        .execute(conn)?;

    let ingredient_rows: Vec<NewRecipeIngredient> = payload
        .ingredients
        .iter()
        .map(|line| NewRecipeIngredient {
            recipe_id,
            ingredient_id: line.id,
            amount: line.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&ingredient_rows)
        .execute(conn)?;

    Ok(())
}

/// Pick the message for a unique violation raised during a recipe write.
/// The transaction touches three tables with unique keys: recipes
/// (name, author_id) and the two join-table primary keys, so the table
/// name on the error decides which contract was hit.
pub fn unique_violation_message(
    info: &(dyn DatabaseErrorInformation + Send + Sync),
) -> &'static str {
    match info.table_name() {
        Some("recipe_ingredients") => "Duplicate ingredient in recipe",
        Some("recipe_tags") => "Duplicate tag in recipe",
        _ => "You already have a recipe with this name",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeErrorInfo {
        table: Option<&'static str>,
    }

    impl DatabaseErrorInformation for FakeErrorInfo {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            self.table
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn valid_payload() -> RecipeWritePayload {
        RecipeWritePayload {
            name: "Pancakes".to_string(),
            image: None,
            text: "Mix and fry.".to_string(),
            cooking_time: 20,
            tags: vec![Uuid::new_v4()],
            ingredients: vec![IngredientAmountPayload {
                id: Uuid::new_v4(),
                amount: 200,
            }],
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(validate(&valid_payload()).is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut p = valid_payload();
        p.name = "   ".to_string();
        assert!(validate(&p).contains_key("name"));
    }

    #[test]
    fn test_zero_cooking_time_rejected() {
        let mut p = valid_payload();
        p.cooking_time = 0;
        assert!(validate(&p).contains_key("cooking_time"));
    }

    #[test]
    fn test_no_tags_rejected() {
        let mut p = valid_payload();
        p.tags.clear();
        assert!(validate(&p).contains_key("tags"));
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let mut p = valid_payload();
        let id = Uuid::new_v4();
        p.tags = vec![id, id];
        assert!(validate(&p).contains_key("tags"));
    }

    #[test]
    fn test_no_ingredients_rejected() {
        let mut p = valid_payload();
        p.ingredients.clear();
        assert!(validate(&p).contains_key("ingredients"));
    }

    #[test]
    fn test_duplicate_ingredient_ids_rejected() {
        let mut p = valid_payload();
        let id = Uuid::new_v4();
        p.ingredients = vec![
            IngredientAmountPayload { id, amount: 1 },
            IngredientAmountPayload { id, amount: 2 },
        ];
        assert!(validate(&p).contains_key("ingredients"));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut p = valid_payload();
        p.ingredients[0].amount = 0;
        assert!(validate(&p).contains_key("ingredients"));
    }

    #[test]
    fn test_multiple_errors_reported_together() {
        let mut p = valid_payload();
        p.name.clear();
        p.tags.clear();
        p.cooking_time = -5;
        let errors = validate(&p);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("tags"));
        assert!(errors.contains_key("cooking_time"));
    }

    #[test]
    fn test_unique_violation_on_recipes_blames_the_name() {
        let info = FakeErrorInfo {
            table: Some("recipes"),
        };
        assert_eq!(
            unique_violation_message(&info),
            "You already have a recipe with this name"
        );
    }

    #[test]
    fn test_unique_violation_on_join_tables_blames_the_duplicate() {
        let info = FakeErrorInfo {
            table: Some("recipe_ingredients"),
        };
        assert_eq!(
            unique_violation_message(&info),
            "Duplicate ingredient in recipe"
        );
        let info = FakeErrorInfo {
            table: Some("recipe_tags"),
        };
        assert_eq!(unique_violation_message(&info), "Duplicate tag in recipe");
    }

    #[test]
    fn test_unique_violation_without_table_info_falls_back() {
        let info = FakeErrorInfo { table: None };
        assert_eq!(
            unique_violation_message(&info),
            "You already have a recipe with this name"
        );
    }
}
