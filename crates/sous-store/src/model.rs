//! Pantry and recipe records.

use crate::StoreError;
use serde::{Deserialize, Serialize};

/// One recipe ingredient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Canonical recipe record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Recipe {
    /// Derived from the title when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub servings: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_site: Option<String>,
    #[serde(default)]
    pub fetched_at: Option<String>,
}

impl Recipe {
    /// Check field constraints before the record is stored.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "recipe title must not be empty".to_string(),
            ));
        }
        if let Some(idx) = self
            .ingredients
            .iter()
            .position(|ingredient| ingredient.name.is_empty())
        {
            return Err(StoreError::InvalidRecord(format!(
                "ingredients[{idx}].name must not be empty"
            )));
        }
        if let Some(url) = self.source_url.as_deref()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(StoreError::InvalidRecord(format!(
                "source_url must be an http(s) url: {url}"
            )));
        }
        Ok(())
    }

    /// Id this recipe is stored under.
    pub fn resolved_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => recipe_id_from_title(&self.title),
        }
    }
}

/// Slug used as the recipe id when none is supplied: trimmed, lower-cased,
/// spaces replaced with `-`. Recipes with the same slug overwrite each other.
pub fn recipe_id_from_title(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "-")
}

/// One pantry entry. Keyed case-insensitively by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PantryItem {
    pub name: String,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    /// ISO date string.
    #[serde(default)]
    pub expires: Option<String>,
}

impl PantryItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qty: None,
            unit: None,
            expires: None,
        }
    }

    /// Storage key for this item.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}
