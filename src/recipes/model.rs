use crate::core::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAME_MAX_LEN: usize = 120;
pub const DIFFICULTY_MAX_LEN: usize = 20;
pub const DEFAULT_PIC: &str = "no_image.jpg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    /// Comma-separated ingredient list, stored as typed
    pub ingredients: String,
    /// Minutes
    pub cooking_time: i32,
    /// Usually "1" (easiest) through "5"
    pub difficulty: String,
    pub pic: String,
}

impl Recipe {
    /// Trimmed, non-empty ingredient names in their original order.
    pub fn ingredient_list(&self) -> Vec<&str> {
        split_ingredients(&self.ingredients)
    }

    /// Numeric difficulty, if the stored value is one.
    pub fn difficulty_level(&self) -> Option<u8> {
        self.difficulty.trim().parse().ok()
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A recipe that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub cooking_time: i32,
    pub difficulty: String,
    pub pic: Option<String>,
}

impl NewRecipe {
    pub fn new(name: &str, ingredients: &str, cooking_time: i32, difficulty: &str) -> Self {
        Self {
            name: name.to_string(),
            ingredients: ingredients.to_string(),
            cooking_time,
            difficulty: difficulty.to_string(),
            pic: None,
        }
    }

    pub fn pic(mut self, pic: &str) -> Self {
        self.pic = Some(pic.to_string());
        self
    }

    /// Column limits of the recipe table
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::ValidationError("Recipe name cannot be empty".into()));
        }
        if self.name.chars().count() > NAME_MAX_LEN {
            return Err(CatalogError::ValidationError(format!(
                "Recipe name cannot exceed {} characters",
                NAME_MAX_LEN
            )));
        }
        if self.difficulty.chars().count() > DIFFICULTY_MAX_LEN {
            return Err(CatalogError::ValidationError(format!(
                "Difficulty cannot exceed {} characters",
                DIFFICULTY_MAX_LEN
            )));
        }
        if self.cooking_time < 0 {
            return Err(CatalogError::ValidationError("Cooking time cannot be negative".into()));
        }
        Ok(())
    }

    pub fn into_recipe(self, id: i64) -> Recipe {
        Recipe {
            id,
            name: self.name,
            ingredients: self.ingredients,
            cooking_time: self.cooking_time,
            difficulty: self.difficulty,
            pic: self.pic.unwrap_or_else(|| DEFAULT_PIC.to_string()),
        }
    }
}

pub(crate) fn split_ingredients(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
