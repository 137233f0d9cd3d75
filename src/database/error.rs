// Copyright 2023 Remi Bernotavicius

pub type MigrationError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("failed to create tables: {0}")]
    Migration(MigrationError),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i32 },
}

pub type Result<T> = std::result::Result<T, Error>;
