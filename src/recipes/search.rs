//! Recipe search form cleaning and the filter it drives.
//!
//! Every criterion narrows the result: maximum difficulty, maximum cooking
//! time, a case-insensitive title fragment, and "contains any of" for the
//! ingredient list.

use super::model::{Recipe, split_ingredients};
use crate::core::{CatalogError, Result};
use serde::{Deserialize, Serialize};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 120;
pub const INGREDIENTS_MAX_LEN: usize = 300;
pub const COOKING_TIME_MAX: i32 = 360;
pub const DIFFICULTY_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

/// Search input as submitted, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSearchForm {
    pub recipe_title: Option<String>,
    /// Comma-separated
    pub recipe_ingredients: Option<String>,
    /// "1".."5", read as a maximum
    pub difficulty_level: Option<String>,
    /// Minutes, read as a maximum
    pub cooking_time: Option<i32>,
}

impl RecipeSearchForm {
    pub fn clean(&self) -> Result<RecipeSearch> {
        Ok(RecipeSearch {
            title: clean_title(self.recipe_title.as_deref())?,
            ingredients: clean_ingredients(self.recipe_ingredients.as_deref())?,
            max_difficulty: clean_difficulty(self.difficulty_level.as_deref())?,
            max_cooking_time: clean_cooking_time(self.cooking_time)?,
        })
    }
}

fn clean_title(raw: Option<&str>) -> Result<Option<String>> {
    let title = raw.map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Ok(None);
    }
    let len = title.chars().count();
    if len > TITLE_MAX_LEN {
        return Err(CatalogError::ValidationError(format!(
            "Recipe title cannot exceed {} characters",
            TITLE_MAX_LEN
        )));
    }
    if len < TITLE_MIN_LEN {
        return Err(CatalogError::ValidationError(
            "Recipe title must be at least 3 characters long".into(),
        ));
    }
    Ok(Some(title.to_string()))
}

fn clean_ingredients(raw: Option<&str>) -> Result<Vec<String>> {
    let raw = raw.unwrap_or_default();
    if raw.chars().count() > INGREDIENTS_MAX_LEN {
        return Err(CatalogError::ValidationError(format!(
            "Ingredients cannot exceed {} characters",
            INGREDIENTS_MAX_LEN
        )));
    }
    Ok(split_ingredients(raw).into_iter().map(str::to_string).collect())
}

fn clean_difficulty(raw: Option<&str>) -> Result<Option<u8>> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u8>() {
        Ok(level) if DIFFICULTY_LEVELS.contains(&level) => Ok(Some(level)),
        _ => Err(CatalogError::ValidationError(format!(
            "Select a valid difficulty: '{}' is not one of 1-5",
            raw
        ))),
    }
}

fn clean_cooking_time(raw: Option<i32>) -> Result<i32> {
    let minutes = raw.unwrap_or(COOKING_TIME_MAX);
    if !(0..=COOKING_TIME_MAX).contains(&minutes) {
        return Err(CatalogError::ValidationError(format!(
            "Cooking time must be between 0 and {} minutes",
            COOKING_TIME_MAX
        )));
    }
    Ok(minutes)
}

/// Validated search criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSearch {
    pub title: Option<String>,
    pub ingredients: Vec<String>,
    pub max_difficulty: Option<u8>,
    pub max_cooking_time: i32,
}

impl Default for RecipeSearch {
    fn default() -> Self {
        Self {
            title: None,
            ingredients: Vec::new(),
            max_difficulty: None,
            max_cooking_time: COOKING_TIME_MAX,
        }
    }
}

impl RecipeSearch {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(max) = self.max_difficulty {
            // Non-numeric difficulties ("Easy") never satisfy a numeric ceiling.
            match recipe.difficulty_level() {
                Some(level) if level <= max => {}
                _ => return false,
            }
        }

        if recipe.cooking_time > self.max_cooking_time {
            return false;
        }

        if let Some(title) = &self.title {
            if !contains_ignore_case(&recipe.name, title) {
                return false;
            }
        }

        self.ingredients.is_empty()
            || self
                .ingredients
                .iter()
                .any(|ingredient| contains_ignore_case(&recipe.ingredients, ingredient))
    }

    pub fn apply(&self, recipes: &[Recipe]) -> Vec<Recipe> {
        recipes
            .iter()
            .filter(|recipe| self.matches(recipe))
            .cloned()
            .collect()
    }

    /// `ILIKE` patterns for the ingredient list.
    pub fn ingredient_patterns(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| like_pattern(i)).collect()
    }

    /// `ILIKE` pattern for the title, if one is set.
    pub fn title_pattern(&self) -> Option<String> {
        self.title.as_deref().map(like_pattern)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
