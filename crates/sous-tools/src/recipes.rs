//! Pantry and recipe tools backed by the SQLite store.

use crate::{Tool, ToolRegistry};
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sous_protocol::ToolError;
use sous_store::{PantryItem, Recipe, SqliteStore, StoreError};
use std::sync::Arc;

/// Register the seven pantry and recipe tools with the provided registry.
pub fn register_recipe_tools(registry: &ToolRegistry, store: Arc<SqliteStore>) {
    registry.register(Arc::new(PantryListItemsTool::new(store.clone())));
    registry.register(Arc::new(PantryUpsertItemTool::new(store.clone())));
    registry.register(Arc::new(PantryUpsertItemsTool::new(store.clone())));
    registry.register(Arc::new(PantryRemoveItemTool::new(store.clone())));
    registry.register(Arc::new(RecipesUpsertTool::new(store.clone())));
    registry.register(Arc::new(RecipesGetTool::new(store.clone())));
    registry.register(Arc::new(RecipesSearchTool::new(store)));
    info!("registered recipe tools");
}

/// Build a registry pre-populated with the recipe tools.
pub fn recipe_tool_registry(store: Arc<SqliteStore>) -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_recipe_tools(&registry, store);
    registry
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

fn store_error(err: StoreError) -> ToolError {
    match err {
        StoreError::InvalidRecord(message) => ToolError::InvalidArguments(message),
        other => ToolError::ExecutionFailed(other.to_string()),
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|err| ToolError::ExecutionFailed(err.to_string()))
}

fn pantry_item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "Ingredient name, e.g. \"chickpeas\"" },
            "qty": { "type": ["number", "null"], "description": "Numeric quantity" },
            "unit": { "type": ["string", "null"], "description": "Unit such as \"cans\", \"g\", \"ml\"" },
            "expires": { "type": ["string", "null"], "description": "ISO date, e.g. \"2026-02-28\"" }
        },
        "required": ["name"]
    })
}

fn recipe_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": ["string", "null"] },
            "title": { "type": "string" },
            "servings": { "type": ["integer", "null"] },
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "qty": { "type": ["number", "null"] },
                        "unit": { "type": ["string", "null"] },
                        "note": { "type": ["string", "null"] }
                    },
                    "required": ["name"]
                }
            },
            "steps": { "type": "array", "items": { "type": "string" } },
            "tags": { "type": "array", "items": { "type": "string" } },
            "source_url": { "type": ["string", "null"], "format": "uri" },
            "source_site": { "type": ["string", "null"] },
            "fetched_at": { "type": ["string", "null"] }
        },
        "required": ["title"]
    })
}

/// Lists every pantry item.
#[derive(Debug)]
pub struct PantryListItemsTool {
    store: Arc<SqliteStore>,
}

impl PantryListItemsTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for PantryListItemsTool {
    fn name(&self) -> &str {
        "pantry_list_items"
    }

    fn description(&self) -> &str {
        "List all pantry items currently stored in the user's pantry. Call this whenever the user \
         asks what they have, and before selecting recipes, building a meal plan, or writing a \
         shopping list. Read-only. Returns a list of items with name, and optional qty, unit, and \
         expires (ISO date). An empty pantry returns an empty list. Item names are \
         case-insensitive."
    }

    fn args_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        let items = self.store.list_pantry().map_err(store_error)?;
        debug!("pantry listed (items={})", items.len());
        to_value(items)
    }
}

#[derive(Debug, Deserialize)]
struct UpsertItemArgs {
    item: PantryItem,
}

/// Adds or overwrites one pantry item.
#[derive(Debug)]
pub struct PantryUpsertItemTool {
    store: Arc<SqliteStore>,
}

impl PantryUpsertItemTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for PantryUpsertItemTool {
    fn name(&self) -> &str {
        "pantry_upsert_item"
    }

    fn description(&self) -> &str {
        "Add a new pantry item or update an existing one (upsert). Use when the user adds an \
         ingredient, changes a quantity or unit, or records an expiry date. Overwrites the stored \
         item with the same name. Returns \"ok\"."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "item": pantry_item_schema() },
            "required": ["item"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: UpsertItemArgs = parse_args(args)?;
        self.store
            .upsert_pantry_item(&input.item)
            .map_err(store_error)?;
        Ok(json!("ok"))
    }
}

#[derive(Debug, Deserialize)]
struct UpsertItemsArgs {
    items: Vec<PantryItem>,
}

/// Adds or overwrites several pantry items at once.
#[derive(Debug)]
pub struct PantryUpsertItemsTool {
    store: Arc<SqliteStore>,
}

impl PantryUpsertItemsTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for PantryUpsertItemsTool {
    fn name(&self) -> &str {
        "pantry_upsert_items"
    }

    fn description(&self) -> &str {
        "Add or update several pantry items in one call (batch upsert), e.g. \"add 2 cans \
         chickpeas, 1 onion, and 500g pasta\". Prefer this over repeated pantry_upsert_item calls. \
         An empty list is a no-op. Returns \"ok\" after all items are saved."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "items": { "type": "array", "items": pantry_item_schema() }
            },
            "required": ["items"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: UpsertItemsArgs = parse_args(args)?;
        for item in &input.items {
            self.store.upsert_pantry_item(item).map_err(store_error)?;
        }
        debug!("pantry batch upserted (items={})", input.items.len());
        Ok(json!("ok"))
    }
}

#[derive(Debug, Deserialize)]
struct RemoveItemArgs {
    item_name: String,
}

/// Removes a pantry item by name.
#[derive(Debug)]
pub struct PantryRemoveItemTool {
    store: Arc<SqliteStore>,
}

impl PantryRemoveItemTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for PantryRemoveItemTool {
    fn name(&self) -> &str {
        "pantry_remove_item"
    }

    fn description(&self) -> &str {
        "Remove a pantry item by name (case-insensitive), e.g. \"remove bread\". Removes the \
         whole entry regardless of quantity; to reduce a quantity use pantry_upsert_item instead. \
         Returns \"removed\" if the item was deleted, \"not found\" if it did not exist."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item_name": { "type": "string", "description": "Ingredient name to remove" }
            },
            "required": ["item_name"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: RemoveItemArgs = parse_args(args)?;
        let deleted = self
            .store
            .remove_pantry_item(&input.item_name)
            .map_err(store_error)?;
        let status = if deleted { "removed" } else { "not found" };
        Ok(json!(status))
    }
}

#[derive(Debug, Deserialize)]
struct RecipeArgs {
    recipe: Recipe,
}

/// Inserts or updates a recipe.
#[derive(Debug)]
pub struct RecipesUpsertTool {
    store: Arc<SqliteStore>,
}

impl RecipesUpsertTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecipesUpsertTool {
    fn name(&self) -> &str {
        "recipes_upsert"
    }

    fn description(&self) -> &str {
        "Insert a new recipe or update an existing one in the local recipe store (upsert). The \
         recipe needs a title and may carry ingredients, steps, tags, servings, and provenance \
         (source_url, source_site, fetched_at). With an id the recipe with that id is updated; \
         without one the id is derived from the title. Keep steps concise and include source_url \
         for recipes from external pages. Returns the stored recipe id."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "recipe": recipe_schema() },
            "required": ["recipe"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: RecipeArgs = parse_args(args)?;
        let id = self.store.upsert_recipe(&input.recipe).map_err(store_error)?;
        Ok(json!(id))
    }
}

#[derive(Debug, Deserialize)]
struct GetRecipeArgs {
    recipe_id: String,
}

/// Fetches one recipe by id.
#[derive(Debug)]
pub struct RecipesGetTool {
    store: Arc<SqliteStore>,
}

impl RecipesGetTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecipesGetTool {
    fn name(&self) -> &str {
        "recipes_get"
    }

    fn description(&self) -> &str {
        "Fetch a single recipe by the id returned from recipes_search or recipes_upsert, to get \
         its full ingredients, steps, and tags. Read-only. Returns the recipe, or null when no \
         recipe has that id; then try another id or broaden the search."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "recipe_id": { "type": "string" } },
            "required": ["recipe_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: GetRecipeArgs = parse_args(args)?;
        let recipe = self
            .store
            .get_recipe(&input.recipe_id)
            .map_err(store_error)?;
        to_value(recipe)
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(default)]
    query: String,
    #[serde(default)]
    tag: Option<String>,
}

/// Searches recipes by title, ingredient name, and tag.
#[derive(Debug)]
pub struct RecipesSearchTool {
    store: Arc<SqliteStore>,
}

impl RecipesSearchTool {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecipesSearchTool {
    fn name(&self) -> &str {
        "recipes_search"
    }

    fn description(&self) -> &str {
        "Search the local recipe store and return matching recipe ids. Use this first when \
         looking for recipes. query is free text matched against recipe titles and ingredient \
         names (empty matches all); tag keeps only recipes carrying exactly that tag, e.g. \
         \"vegetarian\" or \"quick\". Returns a possibly empty list of ids; if empty, broaden the \
         query or drop the tag."
    }

    fn args_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "default": "" },
                "tag": { "type": ["string", "null"] }
            }
        })
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let input: SearchArgs = parse_args(args)?;
        let ids = self
            .store
            .search_recipes(&input.query, input.tag.as_deref())
            .map_err(store_error)?;
        Ok(json!(ids))
    }
}
