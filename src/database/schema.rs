// Columns that databases written by earlier versions of the application left nullable are
// declared `Nullable` here even though freshly created tables fill them in.

diesel::table! {
    #[sql_name = "Ingredients"]
    ingredients (id) {
        id -> Integer,
        name -> Text,
        unit -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "Recipe_Ingredients"]
    recipe_ingredients (recipe_id, ingredient_id) {
        recipe_id -> Integer,
        ingredient_id -> Integer,
        quantity -> Nullable<Double>,
    }
}

diesel::table! {
    #[sql_name = "Recipes"]
    recipes (id) {
        id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
        cooking_time -> Nullable<Integer>,
        created_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    #[sql_name = "Shopping_List"]
    shopping_list (id) {
        id -> Integer,
        recipe_id -> Nullable<Integer>,
        ingredient_id -> Nullable<Integer>,
        quantity -> Nullable<Double>,
        unit -> Nullable<Text>,
        purchased -> Bool,
        added_date -> Timestamp,
    }
}

diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));

diesel::allow_tables_to_appear_in_same_query!(
    ingredients,
    recipe_ingredients,
    recipes,
    shopping_list,
);
