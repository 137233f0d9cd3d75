// Copyright 2023 Remi Bernotavicius

use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

mod error;
pub mod models;
pub mod schema;

pub use error::{Error, Result};

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_connection(path: impl AsRef<Path>) -> Result<Connection> {
    let url = path.as_ref().to_string_lossy();
    Ok(Connection::establish(&url)?)
}

/// Creates any of the tables that don't exist yet. Running this against an already initialized
/// database does nothing.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(Error::Migration)?;
    log::debug!("applied {} pending migration(s)", applied.len());
    Ok(())
}

#[test]
fn migrations() {
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;

    let dir = tempfile::tempdir().unwrap();
    let database_path = dir.path().join("database.sqlite");

    for _ in 0..2 {
        let mut conn = establish_connection(&database_path).unwrap();
        run_migrations(&mut conn).unwrap();
    }

    let mut conn = establish_connection(&database_path).unwrap();
    let counts: [i64; 4] = [
        schema::recipes::table.count().get_result(&mut conn).unwrap(),
        schema::ingredients::table.count().get_result(&mut conn).unwrap(),
        schema::recipe_ingredients::table
            .count()
            .get_result(&mut conn)
            .unwrap(),
        schema::shopping_list::table
            .count()
            .get_result(&mut conn)
            .unwrap(),
    ];
    assert_eq!(counts, [0; 4]);
}
