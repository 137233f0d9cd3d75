use crate::database::models::{RecipeId, ShoppingListEntry, ShoppingListItemId};
use crate::database::{Error, Result};
use crate::query;
use crate::store::RecipeStore;
use diesel::Connection as _;
use std::fmt;

/// Units that stand for "however much you like" and so have no meaningful quantity.
const UNQUANTIFIED_UNITS: [&str; 2] = ["to taste", "по вкусу"];

fn item_not_found(id: ShoppingListItemId) -> Error {
    Error::NotFound {
        what: "shopping list item",
        id: id.into(),
    }
}

impl RecipeStore {
    /// Every item that has both an ingredient and a recipe, unpurchased first, then by ingredient
    /// name.
    pub fn shopping_list(&self) -> Result<Vec<ShoppingListEntry>> {
        self.with_connection("load shopping list", |conn| {
            let entries = query::get_shopping_list(conn)?;
            log::debug!("loaded {} shopping list item(s)", entries.len());
            Ok(entries)
        })
    }

    /// Puts every ingredient of the recipe on the shopping list. Returns how many items were
    /// added.
    pub fn add_recipe_to_shopping_list(&self, recipe_id: RecipeId) -> Result<usize> {
        self.with_connection("add recipe to shopping list", |conn| {
            let added = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let items = query::shopping_list_items_for_recipe(conn, recipe_id)?;
                query::add_shopping_list_items(conn, &items)
            })?;
            log::info!("added {added} item(s) from recipe {recipe_id} to the shopping list");
            Ok(added)
        })
    }

    pub fn set_purchased(&self, id: ShoppingListItemId, purchased: bool) -> Result<()> {
        self.with_connection("mark shopping list item", |conn| {
            if query::set_purchased(conn, id, purchased)? == 0 {
                return Err(item_not_found(id));
            }
            log::info!("shopping list item {id} purchased: {purchased}");
            Ok(())
        })
    }

    pub fn toggle_purchased(&self, id: ShoppingListItemId) -> Result<()> {
        self.with_connection("toggle shopping list item", |conn| {
            if query::toggle_purchased(conn, id)? == 0 {
                return Err(item_not_found(id));
            }
            log::info!("toggled shopping list item {id}");
            Ok(())
        })
    }

    pub fn delete_shopping_list_item(&self, id: ShoppingListItemId) -> Result<()> {
        self.with_connection("delete shopping list item", |conn| {
            if query::delete_shopping_list_item(conn, id)? == 0 {
                return Err(item_not_found(id));
            }
            log::info!("deleted shopping list item {id}");
            Ok(())
        })
    }

    pub fn clear_shopping_list(&self) -> Result<()> {
        self.with_connection("clear shopping list", |conn| {
            let deleted = query::clear_shopping_list(conn)?;
            log::info!("cleared {deleted} item(s) from the shopping list");
            Ok(())
        })
    }
}

/// Displays as the amount to buy, e.g. `500 ml`, or just the unit when it is something like
/// "to taste" or the quantity is missing.
pub struct Amount<'a> {
    quantity: Option<f64>,
    unit: Option<&'a str>,
}

impl ShoppingListEntry {
    pub fn amount(&self) -> Amount<'_> {
        Amount {
            quantity: self.quantity,
            unit: self.unit.as_deref(),
        }
    }
}

impl fmt::Display for Amount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.filter(|unit| !unit.is_empty());
        match (self.quantity, unit) {
            (_, Some(unit)) if UNQUANTIFIED_UNITS.contains(&unit) => write!(f, "{unit}"),
            (Some(quantity), Some(unit)) => write!(f, "{quantity} {unit}"),
            (Some(quantity), None) => write!(f, "{quantity}"),
            (None, Some(unit)) => write!(f, "{unit}"),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(test)]
use crate::database::models::IngredientId;
#[cfg(test)]
use maplit::btreemap;
#[cfg(test)]
use std::collections::BTreeMap;

#[cfg(test)]
fn insert_raw_item(
    store: &RecipeStore,
    recipe_id: Option<RecipeId>,
    ingredient_id: Option<IngredientId>,
    quantity: Option<f64>,
) {
    use crate::database::models::NewShoppingListItem;

    store
        .with_connection("insert test item", |conn| {
            let item = NewShoppingListItem {
                recipe_id,
                ingredient_id,
                quantity,
                unit: None,
            };
            Ok(query::add_shopping_list_items(conn, &[item])?)
        })
        .unwrap();
}

#[cfg(test)]
fn ingredient_names(entries: &[ShoppingListEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.ingredient_name.as_str()).collect()
}

#[test]
fn add_recipe_to_shopping_list() {
    let (_dir, store) = crate::store::test_store();
    let soup = store.add_recipe("Soup", None, 40).unwrap();
    let water = store.add_ingredient("water", Some("ml")).unwrap();
    let salt = store.add_ingredient("salt", Some("to taste")).unwrap();
    store.add_recipe_ingredient(soup, water, 500.0).unwrap();
    store.add_recipe_ingredient(soup, salt, 1.0).unwrap();

    assert!(store.shopping_list().unwrap().is_empty());
    assert_eq!(store.add_recipe_to_shopping_list(soup).unwrap(), 2);

    let entries = store.shopping_list().unwrap();
    assert_eq!(ingredient_names(&entries), ["salt", "water"]);
    assert!(entries.iter().all(|e| e.recipe_name == "Soup" && !e.purchased));
    assert_eq!(entries[1].quantity, Some(500.0));
    assert_eq!(entries[1].unit.as_deref(), Some("ml"));

    let amounts: BTreeMap<_, _> = entries
        .iter()
        .map(|e| (e.ingredient_name.as_str(), e.amount().to_string()))
        .collect();
    assert_eq!(
        amounts,
        btreemap! {
            "salt" => "to taste".to_string(),
            "water" => "500 ml".to_string(),
        }
    );
}

#[test]
fn add_recipe_without_ingredients_to_shopping_list() {
    let (_dir, store) = crate::store::test_store();
    let toast = store.add_recipe("Toast", None, 3).unwrap();
    assert_eq!(store.add_recipe_to_shopping_list(toast).unwrap(), 0);
    assert!(store.shopping_list().unwrap().is_empty());
}

#[test]
fn shopping_list_order_and_toggle() {
    let (_dir, store) = crate::store::test_store();
    let cake = store.add_recipe("Cake", None, 50).unwrap();
    for name in ["sugar", "eggs", "butter"] {
        let ingredient = store.add_ingredient(name, None).unwrap();
        store.add_recipe_ingredient(cake, ingredient, 2.0).unwrap();
    }
    store.add_recipe_to_shopping_list(cake).unwrap();

    let entries = store.shopping_list().unwrap();
    assert_eq!(ingredient_names(&entries), ["butter", "eggs", "sugar"]);

    store.toggle_purchased(entries[0].id).unwrap();
    let entries = store.shopping_list().unwrap();
    assert_eq!(ingredient_names(&entries), ["eggs", "sugar", "butter"]);
    assert!(entries[2].purchased);

    store.toggle_purchased(entries[2].id).unwrap();
    store.set_purchased(entries[1].id, true).unwrap();
    let entries = store.shopping_list().unwrap();
    assert_eq!(ingredient_names(&entries), ["butter", "eggs", "sugar"]);
    assert_eq!(
        entries.iter().map(|e| e.purchased).collect::<Vec<_>>(),
        [false, false, true]
    );
}

#[test]
fn shopping_list_skips_items_without_references() {
    let (_dir, store) = crate::store::test_store();
    let pie = store.add_recipe("Apple Pie", None, 60).unwrap();
    let apples = store.add_ingredient("apples", None).unwrap();

    insert_raw_item(&store, Some(pie), Some(apples), Some(4.0));
    insert_raw_item(&store, None, Some(apples), Some(1.0));
    insert_raw_item(&store, Some(pie), None, Some(1.0));

    let entries = store.shopping_list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].quantity, Some(4.0));
}

#[test]
fn delete_and_clear_shopping_list() {
    let (_dir, store) = crate::store::test_store();
    let soup = store.add_recipe("Soup", None, 40).unwrap();
    for name in ["carrots", "onions"] {
        let ingredient = store.add_ingredient(name, None).unwrap();
        store.add_recipe_ingredient(soup, ingredient, 2.0).unwrap();
    }
    store.add_recipe_to_shopping_list(soup).unwrap();

    let entries = store.shopping_list().unwrap();
    store.delete_shopping_list_item(entries[0].id).unwrap();
    assert_eq!(ingredient_names(&store.shopping_list().unwrap()), ["onions"]);
    assert!(matches!(
        store.delete_shopping_list_item(entries[0].id),
        Err(Error::NotFound { .. })
    ));

    store.clear_shopping_list().unwrap();
    assert!(store.shopping_list().unwrap().is_empty());
    store.clear_shopping_list().unwrap();
}

#[test]
fn toggle_missing_item() {
    let (_dir, store) = crate::store::test_store();
    assert!(matches!(
        store.toggle_purchased(ShoppingListItemId::from(3)),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn amount_display() {
    let amount = |quantity, unit| Amount { quantity, unit }.to_string();

    assert_eq!(amount(Some(500.0), Some("ml")), "500 ml");
    assert_eq!(amount(Some(1.5), Some("g")), "1.5 g");
    assert_eq!(amount(Some(1.0), Some("to taste")), "to taste");
    assert_eq!(amount(Some(1.0), Some("по вкусу")), "по вкусу");
    assert_eq!(amount(Some(3.0), None), "3");
    assert_eq!(amount(Some(3.0), Some("")), "3");
    assert_eq!(amount(None, Some("pinch")), "pinch");
    assert_eq!(amount(None, None), "");
}
