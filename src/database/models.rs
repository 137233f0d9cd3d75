// Copyright 2023 Remi Bernotavicius

use derive_more::{Display, From, Into};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Identifiable, Insertable};
use diesel_derive_newtype::DieselNewType;

#[derive(DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, Copy, Clone)]
pub struct RecipeId(i32);

#[derive(DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, Copy, Clone)]
pub struct IngredientId(i32);

#[derive(DieselNewType, Debug, Display, From, Into, Hash, PartialEq, Eq, Copy, Clone)]
pub struct ShoppingListItemId(i32);

/// A row of `Recipes`. `created_at` is assigned by the database on insert. Rows written by older
/// versions of the application may lack a cooking time or creation time.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeHandle {
    pub id: RecipeId,
    pub name: String,
}

/// The user-editable fields of a recipe, used both to insert and to overwrite.
#[derive(Insertable, AsChangeset, Debug, Clone, Copy)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(treat_none_as_null = true)]
pub struct RecipeForm<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub cooking_time: i32,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub unit: Option<String>,
}

#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub unit: Option<&'a str>,
}

#[derive(Insertable, Debug, Clone, Copy, PartialEq)]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
}

/// An ingredient as used by a particular recipe.
#[derive(Queryable, Debug, Clone, PartialEq)]
pub struct IngredientUsage {
    pub name: String,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::shopping_list)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewShoppingListItem {
    pub recipe_id: Option<RecipeId>,
    pub ingredient_id: Option<IngredientId>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// A shopping list item joined with the names of its ingredient and recipe.
#[derive(Queryable, Debug, Clone, PartialEq)]
pub struct ShoppingListEntry {
    pub id: ShoppingListItemId,
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub recipe_name: String,
    pub purchased: bool,
}
