use crate::database::models::{
    IngredientId, IngredientUsage, Recipe, RecipeHandle, RecipeId, ShoppingListItemId,
};
use crate::database::Error as DatabaseError;
use crate::store::RecipeStore;
use crate::Result;
use std::io::Write;
use std::ops::RangeInclusive;

pub const COOKING_TIME_RANGE: RangeInclusive<i32> = 1..=1440;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("recipe name can't be empty")]
    EmptyName,
    #[error("cooking time must be between 1 and 1440 minutes, not {0}")]
    CookingTimeOutOfRange(i32),
    #[error("recipe has no cooking time, give one with --cooking-time")]
    MissingCookingTime,
}

/// What the user filled in for a recipe, checked the way the recipe form checks it.
#[derive(Debug, PartialEq)]
pub struct RecipeInput {
    pub name: String,
    pub description: Option<String>,
    pub cooking_time: i32,
}

impl RecipeInput {
    pub fn new(
        name: &str,
        description: Option<&str>,
        cooking_time: i32,
    ) -> std::result::Result<Self, FormError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormError::EmptyName);
        }
        if !COOKING_TIME_RANGE.contains(&cooking_time) {
            return Err(FormError::CookingTimeOutOfRange(cooking_time));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        Ok(Self {
            name: name.into(),
            description,
            cooking_time,
        })
    }
}

fn recipe_not_found(id: RecipeId) -> DatabaseError {
    DatabaseError::NotFound {
        what: "recipe",
        id: id.into(),
    }
}

fn existing_recipe(store: &RecipeStore, id: RecipeId) -> Result<Recipe> {
    Ok(store.recipe_details(id)?.ok_or_else(|| recipe_not_found(id))?)
}

fn write_recipe_handles(out: &mut impl Write, recipes: &[RecipeHandle]) -> Result<()> {
    if recipes.is_empty() {
        writeln!(out, "Nothing found")?;
    }
    for recipe in recipes {
        writeln!(out, "{:>4}  {}", i32::from(recipe.id), recipe.name)?;
    }
    Ok(())
}

fn ingredient_line(usage: &IngredientUsage) -> String {
    match (usage.quantity, &usage.unit) {
        (Some(quantity), Some(unit)) if quantity != 0.0 && !unit.is_empty() => {
            format!("• {}: {quantity} {unit}", usage.name)
        }
        _ => format!("• {}", usage.name),
    }
}

pub fn render_recipe(recipe: &Recipe, ingredients: &[IngredientUsage]) -> String {
    let mut text = format!("{}\n", recipe.name);
    match recipe.cooking_time {
        Some(minutes) => text += &format!("Cooking time: {minutes} min\n"),
        None => text += "Cooking time: unknown\n",
    }
    if let Some(created_at) = recipe.created_at {
        text += &format!("Added: {}\n", created_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(description) = &recipe.description {
        text += &format!("\n{description}\n");
    }
    text += "\nIngredients:\n";
    if ingredients.is_empty() {
        text += "No ingredients listed\n";
    }
    for usage in ingredients {
        text += &ingredient_line(usage);
        text += "\n";
    }
    text
}

pub fn add_recipe(
    store: &RecipeStore,
    out: &mut impl Write,
    name: &str,
    description: Option<&str>,
    cooking_time: i32,
) -> Result<()> {
    let input = RecipeInput::new(name, description, cooking_time)?;
    let id = store.add_recipe(&input.name, input.description.as_deref(), input.cooking_time)?;
    writeln!(out, "Added recipe {:?} with id {id}", input.name)?;
    Ok(())
}

pub fn list_recipes(store: &RecipeStore, out: &mut impl Write) -> Result<()> {
    write_recipe_handles(out, &store.list_recipes()?)
}

pub fn show_recipe(store: &RecipeStore, out: &mut impl Write, id: RecipeId) -> Result<()> {
    let recipe = existing_recipe(store, id)?;
    let ingredients = store.recipe_ingredients(id)?;
    write!(out, "{}", render_recipe(&recipe, &ingredients))?;
    Ok(())
}

/// Fields left as `None` keep their current value.
pub fn edit_recipe(
    store: &RecipeStore,
    out: &mut impl Write,
    id: RecipeId,
    name: Option<&str>,
    description: Option<&str>,
    cooking_time: Option<i32>,
) -> Result<()> {
    let current = existing_recipe(store, id)?;
    let input = RecipeInput::new(
        name.unwrap_or(&current.name),
        description.or(current.description.as_deref()),
        cooking_time
            .or(current.cooking_time)
            .ok_or(FormError::MissingCookingTime)?,
    )?;
    store.update_recipe(
        id,
        &input.name,
        input.description.as_deref(),
        input.cooking_time,
    )?;
    writeln!(out, "Updated recipe {:?}", input.name)?;
    Ok(())
}

pub fn delete_recipe(store: &RecipeStore, out: &mut impl Write, id: RecipeId) -> Result<()> {
    let recipe = existing_recipe(store, id)?;
    store.delete_recipe(id)?;
    writeln!(out, "Deleted recipe {:?}", recipe.name)?;
    Ok(())
}

pub fn search_recipes(store: &RecipeStore, out: &mut impl Write, term: &str) -> Result<()> {
    write_recipe_handles(out, &store.search_recipes(term)?)
}

pub fn add_ingredient(
    store: &RecipeStore,
    out: &mut impl Write,
    name: &str,
    unit: Option<&str>,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err("ingredient name can't be empty".into());
    }
    let unit = unit.map(str::trim).filter(|u| !u.is_empty());
    let id = store.add_ingredient(name, unit)?;
    writeln!(out, "Added ingredient {name:?} with id {id}")?;
    Ok(())
}

pub fn list_ingredients(store: &RecipeStore, out: &mut impl Write) -> Result<()> {
    let ingredients = store.list_ingredients()?;
    if ingredients.is_empty() {
        writeln!(out, "No ingredients yet")?;
    }
    for i in ingredients {
        writeln!(
            out,
            "{:>4}  {} ({})",
            i32::from(i.id),
            i.name,
            i.unit.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

pub fn link_ingredient(
    store: &RecipeStore,
    out: &mut impl Write,
    recipe_id: RecipeId,
    ingredient_id: IngredientId,
    quantity: f64,
) -> Result<()> {
    let recipe = existing_recipe(store, recipe_id)?;
    let Some(ingredient) = store.ingredient(ingredient_id)? else {
        return Err(DatabaseError::NotFound {
            what: "ingredient",
            id: ingredient_id.into(),
        }
        .into());
    };
    store.add_recipe_ingredient(recipe_id, ingredient_id, quantity)?;
    writeln!(out, "{:?} now uses {quantity} of {}", recipe.name, ingredient.name)?;
    Ok(())
}

pub fn unlink_ingredient(
    store: &RecipeStore,
    out: &mut impl Write,
    recipe_id: RecipeId,
    ingredient_id: IngredientId,
) -> Result<()> {
    store.remove_recipe_ingredient(recipe_id, ingredient_id)?;
    writeln!(out, "Removed ingredient {ingredient_id} from recipe {recipe_id}")?;
    Ok(())
}

pub fn show_shopping_list(store: &RecipeStore, out: &mut impl Write) -> Result<()> {
    let entries = store.shopping_list()?;
    if entries.is_empty() {
        writeln!(out, "The shopping list is empty")?;
    }
    for entry in &entries {
        writeln!(
            out,
            "{:>4}  [{}] {} - {} ({})",
            i32::from(entry.id),
            if entry.purchased { "x" } else { " " },
            entry.ingredient_name,
            entry.amount(),
            entry.recipe_name
        )?;
    }
    Ok(())
}

pub fn add_recipe_to_shopping_list(
    store: &RecipeStore,
    out: &mut impl Write,
    recipe_id: RecipeId,
) -> Result<()> {
    let recipe = existing_recipe(store, recipe_id)?;
    let added = store.add_recipe_to_shopping_list(recipe_id)?;
    writeln!(out, "Added {added} item(s) from {:?}", recipe.name)?;
    Ok(())
}

pub fn toggle_purchased(
    store: &RecipeStore,
    out: &mut impl Write,
    id: ShoppingListItemId,
) -> Result<()> {
    store.toggle_purchased(id)?;
    writeln!(out, "Toggled item {id}")?;
    Ok(())
}

pub fn set_purchased(
    store: &RecipeStore,
    out: &mut impl Write,
    id: ShoppingListItemId,
    purchased: bool,
) -> Result<()> {
    store.set_purchased(id, purchased)?;
    let state = if purchased { "purchased" } else { "not purchased" };
    writeln!(out, "Marked item {id} as {state}")?;
    Ok(())
}

pub fn delete_shopping_list_item(
    store: &RecipeStore,
    out: &mut impl Write,
    id: ShoppingListItemId,
) -> Result<()> {
    store.delete_shopping_list_item(id)?;
    writeln!(out, "Removed item {id} from the shopping list")?;
    Ok(())
}

pub fn clear_shopping_list(store: &RecipeStore, out: &mut impl Write) -> Result<()> {
    store.clear_shopping_list()?;
    writeln!(out, "Cleared the shopping list")?;
    Ok(())
}

#[cfg(test)]
fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
    let mut out = vec![];
    f(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn recipe_input_validation() {
    assert_eq!(
        RecipeInput::new("  Borscht ", Some("  beets\n"), 90),
        Ok(RecipeInput {
            name: "Borscht".into(),
            description: Some("beets".into()),
            cooking_time: 90,
        })
    );
    assert_eq!(
        RecipeInput::new("Tea", Some("   "), 1).map(|i| i.description),
        Ok(None)
    );
    assert_eq!(RecipeInput::new("   ", None, 30), Err(FormError::EmptyName));
    assert_eq!(
        RecipeInput::new("Tea", None, 0),
        Err(FormError::CookingTimeOutOfRange(0))
    );
    assert_eq!(
        RecipeInput::new("Ham", None, 1441),
        Err(FormError::CookingTimeOutOfRange(1441))
    );
    assert!(RecipeInput::new("Ham", None, 1440).is_ok());
}

#[test]
fn ingredient_lines() {
    let usage = |name: &str, unit: Option<&str>, quantity| IngredientUsage {
        name: name.into(),
        unit: unit.map(String::from),
        quantity,
    };
    assert_eq!(
        ingredient_line(&usage("flour", Some("g"), Some(200.0))),
        "• flour: 200 g"
    );
    assert_eq!(ingredient_line(&usage("eggs", None, Some(2.0))), "• eggs");
    assert_eq!(ingredient_line(&usage("eggs", Some(""), Some(2.0))), "• eggs");
    assert_eq!(ingredient_line(&usage("salt", Some("pinch"), Some(0.0))), "• salt");
    assert_eq!(ingredient_line(&usage("salt", Some("pinch"), None)), "• salt");
}

#[test]
fn render_recipe_without_ingredients() {
    let recipe = Recipe {
        id: RecipeId::from(1),
        name: "Toast".into(),
        description: None,
        cooking_time: Some(3),
        created_at: chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 15, 0),
    };
    assert_eq!(
        render_recipe(&recipe, &[]),
        "Toast\nCooking time: 3 min\nAdded: 2024-03-09 08:15\n\nIngredients:\nNo ingredients listed\n"
    );

    let recipe = Recipe {
        cooking_time: None,
        created_at: None,
        ..recipe
    };
    assert_eq!(
        render_recipe(&recipe, &[]),
        "Toast\nCooking time: unknown\n\nIngredients:\nNo ingredients listed\n"
    );
}

#[test]
fn add_list_and_search() {
    let (_dir, store) = crate::store::test_store();
    assert_eq!(output(|out| list_recipes(&store, out)), "Nothing found\n");

    for name in ["Soup", "Apple Pie", "Bread"] {
        output(|out| add_recipe(&store, out, name, None, 30));
    }
    assert!(add_recipe(&store, &mut std::io::sink(), "  ", None, 30).is_err());

    assert_eq!(
        output(|out| list_recipes(&store, out)),
        "   2  Apple Pie\n   3  Bread\n   1  Soup\n"
    );
    assert_eq!(
        output(|out| search_recipes(&store, out, "pie")),
        "   2  Apple Pie\n"
    );
}

#[test]
fn edit_keeps_unchanged_fields() {
    let (_dir, store) = crate::store::test_store();
    let id = store.add_recipe("Stew", Some("slow"), 120).unwrap();

    output(|out| edit_recipe(&store, out, id, None, None, Some(150)));
    let recipe = store.recipe_details(id).unwrap().unwrap();
    assert_eq!(recipe.name, "Stew");
    assert_eq!(recipe.description.as_deref(), Some("slow"));
    assert_eq!(recipe.cooking_time, Some(150));

    assert!(edit_recipe(&store, &mut std::io::sink(), id, Some(""), None, None).is_err());
    let missing = RecipeId::from(99);
    assert!(edit_recipe(&store, &mut std::io::sink(), missing, None, None, None).is_err());
}

#[test]
fn show_and_delete() {
    let (_dir, store) = crate::store::test_store();
    let id = store.add_recipe("Bread", Some("Knead well."), 60).unwrap();
    let flour = store.add_ingredient("flour", Some("g")).unwrap();
    output(|out| link_ingredient(&store, out, id, flour, 500.0));

    let shown = output(|out| show_recipe(&store, out, id));
    assert!(shown.starts_with("Bread\nCooking time: 60 min\n"));
    assert!(shown.contains("\nKnead well.\n"));
    assert!(shown.ends_with("Ingredients:\n• flour: 500 g\n"));

    assert_eq!(
        output(|out| delete_recipe(&store, out, id)),
        "Deleted recipe \"Bread\"\n"
    );
    assert!(show_recipe(&store, &mut std::io::sink(), id).is_err());
    assert!(delete_recipe(&store, &mut std::io::sink(), id).is_err());
}

#[test]
fn link_unknown_ingredient() {
    let (_dir, store) = crate::store::test_store();
    let id = store.add_recipe("Bread", None, 60).unwrap();
    assert!(link_ingredient(&store, &mut std::io::sink(), id, IngredientId::from(5), 1.0).is_err());
    assert!(store.recipe_ingredients(id).unwrap().is_empty());
}

#[test]
fn shopping_list_output() {
    let (_dir, store) = crate::store::test_store();
    assert_eq!(
        output(|out| show_shopping_list(&store, out)),
        "The shopping list is empty\n"
    );

    let soup = store.add_recipe("Soup", None, 40).unwrap();
    let water = store.add_ingredient("water", Some("ml")).unwrap();
    let salt = store.add_ingredient("salt", Some("to taste")).unwrap();
    store.add_recipe_ingredient(soup, water, 500.0).unwrap();
    store.add_recipe_ingredient(soup, salt, 1.0).unwrap();
    assert_eq!(
        output(|out| add_recipe_to_shopping_list(&store, out, soup)),
        "Added 2 item(s) from \"Soup\"\n"
    );

    let salt_item = store.shopping_list().unwrap()[0].id;
    output(|out| toggle_purchased(&store, out, salt_item));
    assert_eq!(
        output(|out| show_shopping_list(&store, out)),
        "   2  [ ] water - 500 ml (Soup)\n   1  [x] salt - to taste (Soup)\n"
    );

    output(|out| clear_shopping_list(&store, out));
    assert!(store.shopping_list().unwrap().is_empty());
}

#[test]
fn show_and_edit_recipe_with_missing_values() {
    use diesel::connection::SimpleConnection as _;

    let (_dir, store) = crate::store::test_store();
    let id = store.add_recipe("Borscht", None, 90).unwrap();
    let salt = store.add_ingredient("salt", Some("pinch")).unwrap();
    store.add_recipe_ingredient(id, salt, 1.0).unwrap();
    store
        .with_connection("clear values", |conn| {
            conn.batch_execute(
                "UPDATE Recipes SET cooking_time = NULL;
                UPDATE Recipe_Ingredients SET quantity = NULL;",
            )?;
            Ok(())
        })
        .unwrap();

    let shown = output(|out| show_recipe(&store, out, id));
    assert!(shown.starts_with("Borscht\nCooking time: unknown\n"));
    assert!(shown.ends_with("Ingredients:\n• salt\n"));

    let error = edit_recipe(&store, &mut std::io::sink(), id, Some("Red Borscht"), None, None)
        .unwrap_err();
    assert_eq!(
        error.downcast_ref::<FormError>(),
        Some(&FormError::MissingCookingTime)
    );

    output(|out| edit_recipe(&store, out, id, None, None, Some(80)));
    assert_eq!(
        store.recipe_details(id).unwrap().unwrap().cooking_time,
        Some(80)
    );
}
