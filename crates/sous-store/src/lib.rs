//! Pantry and recipe persistence backed by SQLite.

mod error;
mod model;
mod store;

pub use error::StoreError;
pub use model::{Ingredient, PantryItem, Recipe, recipe_id_from_title};
pub use store::SqliteStore;
