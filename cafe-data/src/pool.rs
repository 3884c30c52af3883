use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DataResult, SqlxErrorExt};
use crate::model::{Ingredient, NewDrink, Recipe};
use crate::repository::DrinkRepository;

const CREATE_DRINKS: &str = "CREATE TABLE IF NOT EXISTS drinks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    recipe TEXT NOT NULL
)";

/// Open a SQLite pool for `url`.
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never recycled.
pub async fn connect(url: &str) -> DataResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(SqlxErrorExt::into_data_error)?
        .create_if_missing(true);

    let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;

    info!(url, "Database pool opened");
    Ok(pool)
}

/// Create the schema if it does not exist.
pub async fn migrate(pool: &SqlitePool) -> DataResult<()> {
    sqlx::query(CREATE_DRINKS)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    Ok(())
}

/// Drop all drinks, recreate the schema, and insert the "water" starter drink.
pub async fn reset_and_seed(pool: &SqlitePool) -> DataResult<()> {
    warn!("Resetting drinks table");
    sqlx::query("DROP TABLE IF EXISTS drinks")
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    migrate(pool).await?;

    let water = NewDrink {
        title: "water".into(),
        recipe: Recipe(vec![Ingredient {
            name: "water".into(),
            color: "blue".into(),
            parts: 1,
        }]),
    };
    DrinkRepository::new(pool.clone()).insert(&water).await?;
    Ok(())
}

/// Round-trip a trivial query, for health checks.
pub async fn ping(pool: &SqlitePool) -> DataResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)?;
    Ok(())
}
