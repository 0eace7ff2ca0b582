use std::str::FromStr;

use sqlx::{
    sqlite::SqliteConnectOptions,
    Error, Pool, Sqlite, SqlitePool,
};
use utils::assets::db_path;

pub mod models;

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open (creating if missing) the SQLite database under the asset
    /// directory and run pending migrations.
    pub async fn new() -> Result<DBService, Error> {
        let database_url = format!("sqlite://{}", db_path().to_string_lossy());
        let options = SqliteConnectOptions::from_str(&database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(DBService { pool })
    }

    /// Wrap an existing pool. Used by tests and embedding callers.
    pub fn from_pool(pool: SqlitePool) -> DBService {
        DBService { pool }
    }
}
