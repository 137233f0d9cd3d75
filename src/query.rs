use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, IngredientUsage, NewIngredient, NewShoppingListItem, Recipe,
    RecipeForm, RecipeHandle, RecipeId, RecipeIngredient, ShoppingListEntry, ShoppingListItemId,
};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::NullableExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

fn last_insert_rowid(conn: &mut database::Connection) -> QueryResult<i32> {
    use diesel::dsl::sql;
    use diesel::sql_types::Integer;

    diesel::select(sql::<Integer>("last_insert_rowid()")).get_result(conn)
}

pub fn add_recipe(conn: &mut database::Connection, form: &RecipeForm) -> QueryResult<RecipeId> {
    use database::schema::recipes::dsl::*;
    use diesel::insert_into;

    insert_into(recipes).values(form).execute(conn)?;
    last_insert_rowid(conn).map(RecipeId::from)
}

pub fn list_recipes(conn: &mut database::Connection) -> QueryResult<Vec<RecipeHandle>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(RecipeHandle::as_select())
        .order(name.asc())
        .load(conn)
}

pub fn get_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
) -> QueryResult<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()
}

pub fn get_recipe_ingredients(
    conn: &mut database::Connection,
    for_recipe: RecipeId,
) -> QueryResult<Vec<IngredientUsage>> {
    use database::schema::{ingredients, recipe_ingredients};

    ingredients::table
        .inner_join(recipe_ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(for_recipe))
        .select((
            ingredients::name,
            ingredients::unit,
            recipe_ingredients::quantity,
        ))
        .order(ingredients::name.asc())
        .load(conn)
}

/// Returns the number of rows touched, which is zero when no recipe has the given id.
pub fn update_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    form: &RecipeForm,
) -> QueryResult<usize> {
    use database::schema::recipes::dsl::*;
    use diesel::update;

    update(recipes.find(recipe_id)).set(form).execute(conn)
}

pub fn delete_recipe_ingredients(
    conn: &mut database::Connection,
    delete_id: RecipeId,
) -> QueryResult<usize> {
    use database::schema::recipe_ingredients::dsl::*;
    use diesel::delete;

    delete(recipe_ingredients.filter(recipe_id.eq(delete_id))).execute(conn)
}

pub fn delete_recipe(conn: &mut database::Connection, delete_id: RecipeId) -> QueryResult<usize> {
    use database::schema::recipes::dsl::*;
    use diesel::delete;

    delete(recipes.filter(id.eq(delete_id))).execute(conn)
}

pub fn search_recipes(
    conn: &mut database::Connection,
    query: &str,
) -> QueryResult<Vec<RecipeHandle>> {
    use database::schema::recipes::dsl::*;
    use diesel::expression_methods::TextExpressionMethods as _;

    recipes
        .select(RecipeHandle::as_select())
        .filter(name.like(format!("%{query}%")))
        .order(name.asc())
        .load(conn)
}

pub fn add_ingredient(
    conn: &mut database::Connection,
    new_ingredient: &NewIngredient,
) -> QueryResult<IngredientId> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    insert_into(ingredients)
        .values(new_ingredient)
        .execute(conn)?;
    last_insert_rowid(conn).map(IngredientId::from)
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> QueryResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .first(conn)
        .optional()
}

pub fn list_ingredients(conn: &mut database::Connection) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .order(name.asc())
        .load(conn)
}

pub fn insert_or_update_recipe_ingredient(
    conn: &mut database::Connection,
    usage: &RecipeIngredient,
) -> QueryResult<usize> {
    use database::schema::recipe_ingredients::dsl::*;
    use diesel::insert_into;

    insert_into(recipe_ingredients)
        .values(usage)
        .on_conflict((recipe_id, ingredient_id))
        .do_update()
        .set(quantity.eq(usage.quantity))
        .execute(conn)
}

pub fn delete_recipe_ingredient(
    conn: &mut database::Connection,
    delete_recipe_id: RecipeId,
    delete_ingredient_id: IngredientId,
) -> QueryResult<usize> {
    use database::schema::recipe_ingredients::dsl::*;
    use diesel::delete;

    delete(recipe_ingredients)
        .filter(recipe_id.eq(delete_recipe_id))
        .filter(ingredient_id.eq(delete_ingredient_id))
        .execute(conn)
}

pub fn get_shopping_list(conn: &mut database::Connection) -> QueryResult<Vec<ShoppingListEntry>> {
    use database::schema::{ingredients, recipes, shopping_list};

    shopping_list::table
        .inner_join(
            ingredients::table.on(ingredients::id.nullable().eq(shopping_list::ingredient_id)),
        )
        .inner_join(recipes::table.on(recipes::id.nullable().eq(shopping_list::recipe_id)))
        .select((
            shopping_list::id,
            ingredients::name,
            shopping_list::quantity,
            shopping_list::unit,
            recipes::name,
            shopping_list::purchased,
        ))
        .order((shopping_list::purchased.asc(), ingredients::name.asc()))
        .load(conn)
}

/// Builds one shopping list item per ingredient the recipe uses, carrying the ingredient's unit.
pub fn shopping_list_items_for_recipe(
    conn: &mut database::Connection,
    for_recipe: RecipeId,
) -> QueryResult<Vec<NewShoppingListItem>> {
    use database::schema::{ingredients, recipe_ingredients};

    let rows: Vec<(IngredientId, Option<f64>, Option<String>)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(for_recipe))
        .select((
            recipe_ingredients::ingredient_id,
            recipe_ingredients::quantity,
            ingredients::unit,
        ))
        .order(ingredients::name.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(ingredient_id, quantity, unit)| NewShoppingListItem {
            recipe_id: Some(for_recipe),
            ingredient_id: Some(ingredient_id),
            quantity,
            unit,
        })
        .collect())
}

pub fn add_shopping_list_items(
    conn: &mut database::Connection,
    items: &[NewShoppingListItem],
) -> QueryResult<usize> {
    use database::schema::shopping_list::dsl::*;
    use diesel::insert_into;

    let mut inserted = 0;
    for item in items {
        inserted += insert_into(shopping_list).values(item).execute(conn)?;
    }
    Ok(inserted)
}

pub fn set_purchased(
    conn: &mut database::Connection,
    item_id: ShoppingListItemId,
    is_purchased: bool,
) -> QueryResult<usize> {
    use database::schema::shopping_list::dsl::*;
    use diesel::update;

    update(shopping_list.find(item_id))
        .set(purchased.eq(is_purchased))
        .execute(conn)
}

pub fn toggle_purchased(
    conn: &mut database::Connection,
    item_id: ShoppingListItemId,
) -> QueryResult<usize> {
    use database::schema::shopping_list::dsl::*;
    use diesel::dsl::not;
    use diesel::update;

    update(shopping_list.find(item_id))
        .set(purchased.eq(not(purchased)))
        .execute(conn)
}

pub fn delete_shopping_list_item(
    conn: &mut database::Connection,
    item_id: ShoppingListItemId,
) -> QueryResult<usize> {
    use database::schema::shopping_list::dsl::*;
    use diesel::delete;

    delete(shopping_list.find(item_id)).execute(conn)
}

pub fn clear_shopping_list(conn: &mut database::Connection) -> QueryResult<usize> {
    use database::schema::shopping_list::dsl::*;
    use diesel::delete;

    delete(shopping_list).execute(conn)
}
