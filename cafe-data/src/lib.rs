pub mod error;
pub mod model;
pub mod pool;
pub mod repository;

pub use error::{DataError, DataResult, SqlxErrorExt};
pub use model::{Drink, DrinkPatch, Ingredient, NewDrink, Recipe, ShortDrink, ShortIngredient};
pub use pool::{connect, migrate, ping, reset_and_seed};
pub use repository::{DrinkRepository, Repository};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{DataError, Drink, DrinkRepository, NewDrink, Recipe, Repository};
}
