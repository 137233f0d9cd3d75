// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use database::models::{IngredientId, RecipeId, ShoppingListItemId};
use std::path::PathBuf;

mod cli;
mod database;
mod query;
mod shopping_list;
mod store;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(about = "Keep track of recipes and what to buy for them")]
struct Args {
    /// The recipe database file. Defaults to `cookbook.sqlite` in the user data directory.
    #[arg(long, global = true, env = "RECIPE_MANAGER_DATABASE")]
    database: Option<PathBuf>,

    /// Log more; repeat for more detail.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// In minutes.
        #[arg(short = 't', long, default_value_t = 30)]
        cooking_time: i32,
    },
    List,
    Show {
        id: i32,
    },
    /// Change a recipe. Anything not given keeps its current value.
    Edit {
        id: i32,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short = 't', long)]
        cooking_time: Option<i32>,
    },
    Delete {
        id: i32,
    },
    /// Find recipes whose name contains the given text.
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    #[command(subcommand)]
    Ingredient(IngredientCommands),
    #[command(subcommand)]
    Shopping(ShoppingCommands),
}

#[derive(Debug, Subcommand)]
enum IngredientCommands {
    Add {
        name: String,
        #[arg(short, long)]
        unit: Option<String>,
    },
    List,
    /// Use an ingredient in a recipe, or change how much of it the recipe uses.
    Link {
        recipe_id: i32,
        ingredient_id: i32,
        quantity: f64,
    },
    Unlink {
        recipe_id: i32,
        ingredient_id: i32,
    },
}

#[derive(Debug, Subcommand)]
enum ShoppingCommands {
    List,
    /// Put every ingredient of a recipe on the shopping list.
    AddRecipe {
        recipe_id: i32,
    },
    Toggle {
        id: i32,
    },
    Mark {
        id: i32,
        #[arg(action = clap::ArgAction::Set)]
        purchased: bool,
    },
    Delete {
        id: i32,
    },
    Clear,
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/recipe_manager/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("recipe_manager");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

fn run_ingredient_command(
    store: &store::RecipeStore,
    out: &mut impl std::io::Write,
    command: IngredientCommands,
) -> Result<()> {
    match command {
        IngredientCommands::Add { name, unit } => {
            cli::add_ingredient(store, out, &name, unit.as_deref())
        }
        IngredientCommands::List => cli::list_ingredients(store, out),
        IngredientCommands::Link {
            recipe_id,
            ingredient_id,
            quantity,
        } => cli::link_ingredient(
            store,
            out,
            RecipeId::from(recipe_id),
            IngredientId::from(ingredient_id),
            quantity,
        ),
        IngredientCommands::Unlink {
            recipe_id,
            ingredient_id,
        } => cli::unlink_ingredient(
            store,
            out,
            RecipeId::from(recipe_id),
            IngredientId::from(ingredient_id),
        ),
    }
}

fn run_shopping_command(
    store: &store::RecipeStore,
    out: &mut impl std::io::Write,
    command: ShoppingCommands,
) -> Result<()> {
    match command {
        ShoppingCommands::List => cli::show_shopping_list(store, out),
        ShoppingCommands::AddRecipe { recipe_id } => {
            cli::add_recipe_to_shopping_list(store, out, RecipeId::from(recipe_id))
        }
        ShoppingCommands::Toggle { id } => {
            cli::toggle_purchased(store, out, ShoppingListItemId::from(id))
        }
        ShoppingCommands::Mark { id, purchased } => {
            cli::set_purchased(store, out, ShoppingListItemId::from(id), purchased)
        }
        ShoppingCommands::Delete { id } => {
            cli::delete_shopping_list_item(store, out, ShoppingListItemId::from(id))
        }
        ShoppingCommands::Clear => cli::clear_shopping_list(store, out),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(log_level(args.verbose))
        .init()?;

    let database_path = match args.database {
        Some(path) => path,
        None => data_path()?.join("cookbook.sqlite"),
    };
    let store = store::RecipeStore::new(database_path);
    if store.initialize().is_err() {
        log::warn!(
            "continuing without creating tables in {}",
            store.path().display()
        );
    }

    let out = &mut std::io::stdout().lock();
    match args.commands {
        Commands::Add {
            name,
            description,
            cooking_time,
        } => cli::add_recipe(&store, out, &name, description.as_deref(), cooking_time)?,
        Commands::List => cli::list_recipes(&store, out)?,
        Commands::Show { id } => cli::show_recipe(&store, out, RecipeId::from(id))?,
        Commands::Edit {
            id,
            name,
            description,
            cooking_time,
        } => cli::edit_recipe(
            &store,
            out,
            RecipeId::from(id),
            name.as_deref(),
            description.as_deref(),
            cooking_time,
        )?,
        Commands::Delete { id } => cli::delete_recipe(&store, out, RecipeId::from(id))?,
        Commands::Search { term } => cli::search_recipes(&store, out, &term)?,
        Commands::Ingredient(command) => run_ingredient_command(&store, out, command)?,
        Commands::Shopping(command) => run_shopping_command(&store, out, command)?,
    }
    Ok(())
}

#[test]
fn verify_args() {
    use clap::CommandFactory as _;
    Args::command().debug_assert();
}

#[test]
fn parse_args() {
    let args = Args::try_parse_from([
        "recipe-store",
        "--database",
        "/tmp/cookbook.sqlite",
        "-vv",
        "edit",
        "4",
        "--cooking-time",
        "45",
    ])
    .unwrap();
    assert_eq!(args.database, Some(PathBuf::from("/tmp/cookbook.sqlite")));
    assert_eq!(log_level(args.verbose), log::LevelFilter::Debug);
    assert!(matches!(
        args.commands,
        Commands::Edit {
            id: 4,
            name: None,
            description: None,
            cooking_time: Some(45),
        }
    ));

    let args = Args::try_parse_from(["recipe-store", "shopping", "mark", "2", "false"]).unwrap();
    assert!(matches!(
        args.commands,
        Commands::Shopping(ShoppingCommands::Mark {
            id: 2,
            purchased: false
        })
    ));
}
