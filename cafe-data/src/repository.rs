use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DataError, DataResult, SqlxErrorExt};
use crate::model::{Drink, Ingredient, NewDrink};

/// Generic async repository trait for keyed entities.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait Repository<T, ID>: Send + Sync
where
    T: Send + Sync + 'static,
    ID: Send + Sync + 'static,
{
    fn find_by_id(&self, id: ID) -> impl Future<Output = DataResult<Option<T>>> + Send;
    fn find_all(&self) -> impl Future<Output = DataResult<Vec<T>>> + Send;
    fn delete(&self, id: ID) -> impl Future<Output = DataResult<bool>> + Send;
    fn count(&self) -> impl Future<Output = DataResult<u64>> + Send;
}

/// SQLite-backed drink storage. The recipe column holds the ingredient list
/// as JSON text.
#[derive(Clone)]
pub struct DrinkRepository {
    pool: SqlitePool,
}

impl DrinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find_by_title(&self, title: &str) -> DataResult<Option<Drink>> {
        sqlx::query("SELECT id, title, recipe FROM drinks WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?
            .as_ref()
            .map(drink_from_row)
            .transpose()
    }

    /// Insert a drink. A duplicate title is a [`DataError::Conflict`].
    pub async fn insert(&self, drink: &NewDrink) -> DataResult<Drink> {
        let recipe = encode_recipe(&drink.recipe.0)?;
        let result = sqlx::query("INSERT INTO drinks (title, recipe) VALUES (?, ?)")
            .bind(&drink.title)
            .bind(recipe)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let id = result.last_insert_rowid();
        debug!(id, title = %drink.title, "Drink inserted");
        Ok(Drink {
            id,
            title: drink.title.clone(),
            recipe: drink.recipe.0.clone(),
        })
    }

    /// Overwrite title and recipe of an existing drink.
    pub async fn update(&self, drink: &Drink) -> DataResult<Drink> {
        let recipe = encode_recipe(&drink.recipe)?;
        let result = sqlx::query("UPDATE drinks SET title = ?, recipe = ? WHERE id = ?")
            .bind(&drink.title)
            .bind(recipe)
            .bind(drink.id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound(format!("drink {}", drink.id)));
        }
        debug!(id = drink.id, "Drink updated");
        Ok(drink.clone())
    }
}

impl Repository<Drink, i64> for DrinkRepository {
    async fn find_by_id(&self, id: i64) -> DataResult<Option<Drink>> {
        sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?
            .as_ref()
            .map(drink_from_row)
            .transpose()
    }

    async fn find_all(&self) -> DataResult<Vec<Drink>> {
        sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?
            .iter()
            .map(drink_from_row)
            .collect()
    }

    async fn delete(&self, id: i64) -> DataResult<bool> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> DataResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drinks")
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(count as u64)
    }
}

fn encode_recipe(recipe: &[Ingredient]) -> DataResult<String> {
    serde_json::to_string(recipe).map_err(|e| DataError::Other(format!("cannot encode recipe: {e}")))
}

fn drink_from_row(row: &SqliteRow) -> DataResult<Drink> {
    let id: i64 = row.try_get("id").map_err(SqlxErrorExt::into_data_error)?;
    let title: String = row.try_get("title").map_err(SqlxErrorExt::into_data_error)?;
    let recipe: String = row.try_get("recipe").map_err(SqlxErrorExt::into_data_error)?;
    let recipe = serde_json::from_str(&recipe)
        .map_err(|e| DataError::Other(format!("drink {id} has an unreadable recipe: {e}")))?;
    Ok(Drink { id, title, recipe })
}
