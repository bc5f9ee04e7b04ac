pub mod matches;
pub mod migrations;
pub mod pool;
pub mod profiles;
pub mod util;

use std::str::FromStr;

use tokio_postgres::Row;

pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked, ping};

use crate::store::SourceError;

/// Postgres-backed implementation of the storage traits, schema `am`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Reads a text column into a strum enum.
pub(crate) fn text_enum<T: FromStr>(row: &Row, column: &str) -> Result<T, SourceError> {
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|_| SourceError::Decode(format!("{column}: unexpected value '{raw}'")))
}
