//! SQLite-backed pantry and recipe store.

use crate::{PantryItem, Recipe, StoreError};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS recipes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    recipe_json TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS pantry (
    name TEXT PRIMARY KEY,
    item_json TEXT NOT NULL
);
";

const SEARCH_SQL: &str = "
SELECT id, recipe_json FROM recipes
WHERE LOWER(title) LIKE ?1
   OR EXISTS (
       SELECT 1 FROM json_each(recipe_json, '$.ingredients') AS ing
       WHERE LOWER(json_extract(ing.value, '$.name')) LIKE ?1
   )
ORDER BY id
";

/// Pantry and recipe store. Writes are serialized through one connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::from_connection(Connection::open(path)?)?;
        info!("opened recipe store (path={})", path.display());
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a recipe and return the id it was stored under.
    pub fn upsert_recipe(&self, recipe: &Recipe) -> Result<String, StoreError> {
        recipe.validate()?;
        let id = recipe.resolved_id();
        let stored = Recipe {
            id: Some(id.clone()),
            ..recipe.clone()
        };
        let payload = serde_json::to_string(&stored)?;
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO recipes (id, title, recipe_json) VALUES (?1, ?2, ?3)",
            params![id, stored.title, payload],
        )?;
        debug!("recipe upserted (id={id})");
        Ok(id)
    }

    /// Fetch a recipe by id.
    pub fn get_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>, StoreError> {
        let row: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT recipe_json FROM recipes WHERE id = ?1",
                params![recipe_id],
                |row| row.get(0),
            )
            .optional()?;
        row.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
            .transpose()
    }

    /// Ids of recipes whose title or any ingredient name contains `query`
    /// (case-insensitive), optionally restricted to recipes tagged exactly `tag`.
    /// A blank query matches every recipe.
    pub fn search_recipes(&self, query: &str, tag: Option<&str>) -> Result<Vec<String>, StoreError> {
        let query = query.trim();
        let rows = {
            let conn = self.conn.lock();
            let mut rows: Vec<(String, String)> = Vec::new();
            if query.is_empty() {
                let mut stmt = conn.prepare("SELECT id, recipe_json FROM recipes ORDER BY id")?;
                for row in stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))? {
                    rows.push(row?);
                }
            } else {
                let pattern = format!("%{}%", query.to_lowercase());
                let mut stmt = conn.prepare(SEARCH_SQL)?;
                for row in stmt.query_map(params![pattern], |row| Ok((row.get(0)?, row.get(1)?)))? {
                    rows.push(row?);
                }
            }
            rows
        };

        let tag = tag.filter(|tag| !tag.is_empty());
        let mut ids = Vec::with_capacity(rows.len());
        for (id, json) in rows {
            if let Some(tag) = tag {
                let recipe: Recipe = serde_json::from_str(&json)?;
                if !recipe.tags.iter().any(|candidate| candidate == tag) {
                    continue;
                }
            }
            ids.push(id);
        }
        debug!(
            "recipe search (query={query}, tag={}, hits={})",
            tag.unwrap_or("-"),
            ids.len()
        );
        Ok(ids)
    }

    /// Every pantry item, ordered by name.
    pub fn list_pantry(&self) -> Result<Vec<PantryItem>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT item_json FROM pantry ORDER BY name")?;
        let mut items = Vec::new();
        for json in stmt.query_map([], |row| row.get::<_, String>(0))? {
            items.push(serde_json::from_str(&json?)?);
        }
        Ok(items)
    }

    /// Insert or overwrite the item stored under the lower-cased name.
    pub fn upsert_pantry_item(&self, item: &PantryItem) -> Result<(), StoreError> {
        if item.name.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "pantry item name must not be empty".to_string(),
            ));
        }
        let payload = serde_json::to_string(item)?;
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO pantry (name, item_json) VALUES (?1, ?2)",
            params![item.key(), payload],
        )?;
        debug!("pantry item upserted (name={})", item.key());
        Ok(())
    }

    /// Remove an item by name, case-insensitively. Returns whether a row was deleted.
    pub fn remove_pantry_item(&self, item_name: &str) -> Result<bool, StoreError> {
        let deleted = self.conn.lock().execute(
            "DELETE FROM pantry WHERE name = ?1",
            params![item_name.to_lowercase()],
        )?;
        debug!("pantry item remove (name={item_name}, deleted={deleted})");
        Ok(deleted > 0)
    }
}
