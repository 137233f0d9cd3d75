// Copyright 2023 Remi Bernotavicius

use crate::database::models::{
    Ingredient, IngredientId, IngredientUsage, NewIngredient, Recipe, RecipeForm, RecipeHandle,
    RecipeId, RecipeIngredient,
};
use crate::database::{self, Error, Result};
use crate::query;
use diesel::Connection as _;
use std::path::{Path, PathBuf};

/// Access to the recipe database file.
///
/// Nothing is held open between calls: every operation establishes its own connection, runs its
/// statements, and drops the connection before returning. Failures are logged here and handed
/// back to the caller, which decides how to degrade.
pub struct RecipeStore {
    path: PathBuf,
}

impl RecipeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn with_connection<T>(
        &self,
        operation: &str,
        body: impl FnOnce(&mut database::Connection) -> Result<T>,
    ) -> Result<T> {
        let result =
            database::establish_connection(&self.path).and_then(|mut conn| body(&mut conn));
        if let Err(error) = &result {
            log::error!("failed to {operation}: {error}");
        }
        result
    }

    /// Creates the tables if they are missing. Safe to call on every startup.
    pub fn initialize(&self) -> Result<()> {
        self.with_connection("create tables", |conn| {
            database::run_migrations(conn)?;
            log::info!("database ready at {}", self.path.display());
            Ok(())
        })
    }

    /// No validation happens here; an empty name is stored as is.
    pub fn add_recipe(
        &self,
        name: &str,
        description: Option<&str>,
        cooking_time: i32,
    ) -> Result<RecipeId> {
        let form = RecipeForm {
            name,
            description,
            cooking_time,
        };
        self.with_connection("add recipe", |conn| {
            let id = query::add_recipe(conn, &form)?;
            log::info!("added recipe {name:?} with id {id}");
            Ok(id)
        })
    }

    pub fn list_recipes(&self) -> Result<Vec<RecipeHandle>> {
        self.with_connection("list recipes", |conn| {
            let recipes = query::list_recipes(conn)?;
            log::debug!("loaded {} recipe(s)", recipes.len());
            Ok(recipes)
        })
    }

    pub fn recipe_details(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.with_connection("load recipe details", |conn| {
            Ok(query::get_recipe(conn, id)?)
        })
    }

    pub fn recipe_ingredients(&self, id: RecipeId) -> Result<Vec<IngredientUsage>> {
        self.with_connection("load recipe ingredients", |conn| {
            let usages = query::get_recipe_ingredients(conn, id)?;
            log::debug!("loaded {} ingredient(s) for recipe {id}", usages.len());
            Ok(usages)
        })
    }

    /// Overwrites every editable field of the recipe.
    ///
    /// Updating an id that doesn't exist touches no rows and still succeeds.
    pub fn update_recipe(
        &self,
        id: RecipeId,
        name: &str,
        description: Option<&str>,
        cooking_time: i32,
    ) -> Result<()> {
        let form = RecipeForm {
            name,
            description,
            cooking_time,
        };
        self.with_connection("update recipe", |conn| {
            let updated = query::update_recipe(conn, id, &form)?;
            if updated == 0 {
                log::warn!("update of recipe {id} matched no rows");
            } else {
                log::info!("updated recipe {id}");
            }
            Ok(())
        })
    }

    /// Removes the recipe along with its ingredient links, committed together.
    pub fn delete_recipe(&self, id: RecipeId) -> Result<()> {
        self.with_connection("delete recipe", |conn| {
            let (links, rows) = conn.transaction(|conn| {
                let links = query::delete_recipe_ingredients(conn, id)?;
                let rows = query::delete_recipe(conn, id)?;
                Ok::<_, diesel::result::Error>((links, rows))
            })?;
            log::info!("deleted recipe {id} ({rows} row(s), {links} ingredient link(s))");
            Ok(())
        })
    }

    /// Recipes whose name contains `term`, ordered by name. An empty term matches everything.
    pub fn search_recipes(&self, term: &str) -> Result<Vec<RecipeHandle>> {
        self.with_connection("search recipes", |conn| {
            let recipes = query::search_recipes(conn, term)?;
            log::debug!("found {} recipe(s) matching {term:?}", recipes.len());
            Ok(recipes)
        })
    }

    pub fn add_ingredient(&self, name: &str, unit: Option<&str>) -> Result<IngredientId> {
        let new_ingredient = NewIngredient { name, unit };
        self.with_connection("add ingredient", |conn| {
            let id = query::add_ingredient(conn, &new_ingredient)?;
            log::info!("added ingredient {name:?} with id {id}");
            Ok(id)
        })
    }

    pub fn ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>> {
        self.with_connection("load ingredient", |conn| {
            Ok(query::get_ingredient(conn, id)?)
        })
    }

    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.with_connection("list ingredients", |conn| {
            Ok(query::list_ingredients(conn)?)
        })
    }

    /// Links an ingredient to a recipe, replacing the quantity if they are already linked.
    pub fn add_recipe_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
        quantity: f64,
    ) -> Result<()> {
        self.with_connection("link ingredient", |conn| {
            let usage = RecipeIngredient {
                recipe_id,
                ingredient_id,
                quantity,
            };
            query::insert_or_update_recipe_ingredient(conn, &usage)?;
            log::info!("recipe {recipe_id} uses {quantity} of ingredient {ingredient_id}");
            Ok(())
        })
    }

    pub fn remove_recipe_ingredient(
        &self,
        recipe_id: RecipeId,
        ingredient_id: IngredientId,
    ) -> Result<()> {
        self.with_connection("unlink ingredient", |conn| {
            if query::delete_recipe_ingredient(conn, recipe_id, ingredient_id)? == 0 {
                return Err(Error::NotFound {
                    what: "ingredient link",
                    id: ingredient_id.into(),
                });
            }
            log::info!("recipe {recipe_id} no longer uses ingredient {ingredient_id}");
            Ok(())
        })
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, RecipeStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RecipeStore::new(dir.path().join("cookbook.sqlite"));
    store.initialize().unwrap();
    (dir, store)
}

#[cfg(test)]
fn names(recipes: &[RecipeHandle]) -> Vec<&str> {
    recipes.iter().map(|r| r.name.as_str()).collect()
}

#[cfg(test)]
fn add_sample_recipes(store: &RecipeStore) {
    for name in ["Soup", "Apple Pie", "Bread"] {
        store.add_recipe(name, None, 30).unwrap();
    }
}

#[test]
fn initialize_twice() {
    let (_dir, store) = test_store();
    store.initialize().unwrap();
    store.add_recipe("Soup", None, 10).unwrap();
    store.initialize().unwrap();
    assert_eq!(store.list_recipes().unwrap().len(), 1);
}

#[test]
fn initialize_unreachable_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecipeStore::new(dir.path().join("missing").join("cookbook.sqlite"));
    assert!(matches!(store.initialize(), Err(Error::Connection(_))));
}

#[test]
fn initialize_adopts_tables_with_missing_values() {
    use diesel::connection::SimpleConnection as _;

    let dir = tempfile::tempdir().unwrap();
    let store = RecipeStore::new(dir.path().join("cookbook.sqlite"));
    store
        .with_connection("create old tables", |conn| {
            conn.batch_execute(
                "CREATE TABLE Recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT,
                    cooking_time INTEGER,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                );
                CREATE TABLE Ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    unit TEXT
                );
                CREATE TABLE Recipe_Ingredients (
                    recipe_id INTEGER,
                    ingredient_id INTEGER,
                    quantity REAL,
                    PRIMARY KEY (recipe_id, ingredient_id)
                );
                INSERT INTO Recipes (name, description, cooking_time) VALUES ('Borscht', 'beets', NULL);
                INSERT INTO Ingredients (name, unit) VALUES ('beets', 'g'), ('salt', 'pinch');
                INSERT INTO Recipe_Ingredients VALUES (1, 1, 300), (1, 2, NULL);",
            )?;
            Ok(())
        })
        .unwrap();

    store.initialize().unwrap();

    let borscht = RecipeId::from(1);
    let recipe = store.recipe_details(borscht).unwrap().unwrap();
    assert_eq!(recipe.name, "Borscht");
    assert_eq!(recipe.cooking_time, None);
    assert!(recipe.created_at.is_some());

    assert_eq!(
        store.recipe_ingredients(borscht).unwrap(),
        vec![
            IngredientUsage {
                name: "beets".into(),
                unit: Some("g".into()),
                quantity: Some(300.0),
            },
            IngredientUsage {
                name: "salt".into(),
                unit: Some("pinch".into()),
                quantity: None,
            },
        ]
    );

    assert_eq!(store.add_recipe_to_shopping_list(borscht).unwrap(), 2);
    let entries = store.shopping_list().unwrap();
    assert_eq!(entries[1].ingredient_name, "salt");
    assert_eq!(entries[1].quantity, None);
}

#[test]
fn add_and_get_recipe() {
    let (_dir, store) = test_store();
    let id = store
        .add_recipe("Pancakes", Some("Mix and fry."), 25)
        .unwrap();

    let recipe = store.recipe_details(id).unwrap().unwrap();
    assert_eq!(recipe.id, id);
    assert_eq!(recipe.name, "Pancakes");
    assert_eq!(recipe.description.as_deref(), Some("Mix and fry."));
    assert_eq!(recipe.cooking_time, Some(25));
}

#[test]
fn add_recipe_accepts_empty_name() {
    let (_dir, store) = test_store();
    let id = store.add_recipe("", None, 5).unwrap();
    let recipe = store.recipe_details(id).unwrap().unwrap();
    assert_eq!(recipe.name, "");
    assert_eq!(recipe.description, None);
}

#[test]
fn recipe_ids_are_distinct() {
    let (_dir, store) = test_store();
    let a = store.add_recipe("A", None, 1).unwrap();
    let b = store.add_recipe("B", None, 1).unwrap();
    assert_ne!(a, b);
}

#[test]
fn list_recipes_sorted_by_name() {
    let (_dir, store) = test_store();
    assert!(store.list_recipes().unwrap().is_empty());

    add_sample_recipes(&store);
    let recipes = store.list_recipes().unwrap();
    assert_eq!(names(&recipes), ["Apple Pie", "Bread", "Soup"]);
}

#[test]
fn recipe_details_not_found() {
    let (_dir, store) = test_store();
    assert_eq!(store.recipe_details(RecipeId::from(42)).unwrap(), None);
}

#[test]
fn update_recipe() {
    let (_dir, store) = test_store();
    let id = store.add_recipe("Stew", Some("slow"), 120).unwrap();
    let created_at = store.recipe_details(id).unwrap().unwrap().created_at;

    store.update_recipe(id, "Beef Stew", None, 150).unwrap();

    let recipe = store.recipe_details(id).unwrap().unwrap();
    assert_eq!(recipe.name, "Beef Stew");
    assert_eq!(recipe.description, None);
    assert_eq!(recipe.cooking_time, Some(150));
    assert_eq!(recipe.created_at, created_at);
}

#[test]
fn update_missing_recipe_succeeds() {
    let (_dir, store) = test_store();
    add_sample_recipes(&store);

    store
        .update_recipe(RecipeId::from(999), "Ghost", None, 1)
        .unwrap();

    let recipes = store.list_recipes().unwrap();
    assert_eq!(names(&recipes), ["Apple Pie", "Bread", "Soup"]);
}

#[test]
fn delete_recipe_removes_links() {
    let (_dir, store) = test_store();
    let soup = store.add_recipe("Soup", None, 40).unwrap();
    let bread = store.add_recipe("Bread", None, 60).unwrap();
    let water = store.add_ingredient("water", Some("ml")).unwrap();
    let salt = store.add_ingredient("salt", Some("to taste")).unwrap();
    store.add_recipe_ingredient(soup, water, 500.0).unwrap();
    store.add_recipe_ingredient(soup, salt, 1.0).unwrap();
    store.add_recipe_ingredient(bread, water, 300.0).unwrap();

    store.delete_recipe(soup).unwrap();

    assert_eq!(store.recipe_details(soup).unwrap(), None);
    assert!(store.recipe_ingredients(soup).unwrap().is_empty());
    assert_eq!(store.recipe_ingredients(bread).unwrap().len(), 1);
    assert_eq!(names(&store.list_recipes().unwrap()), ["Bread"]);
}

#[test]
fn delete_missing_recipe() {
    let (_dir, store) = test_store();
    store.delete_recipe(RecipeId::from(7)).unwrap();
}

#[test]
fn search_recipes() {
    let (_dir, store) = test_store();
    add_sample_recipes(&store);

    assert_eq!(names(&store.search_recipes("pie").unwrap()), ["Apple Pie"]);
    assert_eq!(
        names(&store.search_recipes("").unwrap()),
        ["Apple Pie", "Bread", "Soup"]
    );
    assert_eq!(names(&store.search_recipes("e").unwrap()), ["Apple Pie", "Bread"]);
    assert!(store.search_recipes("curry").unwrap().is_empty());
}

#[test]
fn search_term_is_not_sql() {
    let (_dir, store) = test_store();
    add_sample_recipes(&store);
    assert!(store
        .search_recipes("' OR 1=1 --")
        .unwrap()
        .is_empty());
}

#[test]
fn recipe_ingredients() {
    let (_dir, store) = test_store();
    let id = store.add_recipe("Bread", None, 60).unwrap();
    assert!(store.recipe_ingredients(id).unwrap().is_empty());

    let flour = store.add_ingredient("flour", Some("g")).unwrap();
    let yeast = store.add_ingredient("yeast", None).unwrap();
    store.add_recipe_ingredient(id, yeast, 1.5).unwrap();
    store.add_recipe_ingredient(id, flour, 400.0).unwrap();
    store.add_recipe_ingredient(id, flour, 500.0).unwrap();

    assert_eq!(
        store.recipe_ingredients(id).unwrap(),
        vec![
            IngredientUsage {
                name: "flour".into(),
                unit: Some("g".into()),
                quantity: Some(500.0),
            },
            IngredientUsage {
                name: "yeast".into(),
                unit: None,
                quantity: Some(1.5),
            },
        ]
    );

    store.remove_recipe_ingredient(id, yeast).unwrap();
    assert_eq!(store.recipe_ingredients(id).unwrap().len(), 1);
    assert!(matches!(
        store.remove_recipe_ingredient(id, yeast),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn list_ingredients_sorted_by_name() {
    let (_dir, store) = test_store();
    store.add_ingredient("sugar", Some("g")).unwrap();
    store.add_ingredient("milk", Some("ml")).unwrap();

    let ingredients = store.list_ingredients().unwrap();
    let names: Vec<_> = ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["milk", "sugar"]);
    assert_eq!(ingredients[0].unit.as_deref(), Some("ml"));
}

#[test]
fn ingredient_by_id() {
    let (_dir, store) = test_store();
    let milk = store.add_ingredient("milk", Some("ml")).unwrap();
    store.add_ingredient("sugar", None).unwrap();

    let ingredient = store.ingredient(milk).unwrap().unwrap();
    assert_eq!(ingredient.id, milk);
    assert_eq!(ingredient.name, "milk");
    assert_eq!(ingredient.unit.as_deref(), Some("ml"));
    assert!(store.ingredient(IngredientId::from(99)).unwrap().is_none());
}
