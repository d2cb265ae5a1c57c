use super::model::{NewRecipe, Recipe};
use super::search::RecipeSearch;
use crate::connection::PgConnection;
use crate::core::{CatalogError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tokio_postgres::Row;

/// Recipe storage plus per-user bookmarks.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Recipe>>;
    async fn get(&self, id: i64) -> Result<Option<Recipe>>;
    async fn search(&self, search: &RecipeSearch) -> Result<Vec<Recipe>>;
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe>;

    /// Bookmark `recipe_id` for `user_id`; saving twice is a no-op.
    async fn save_for_user(&self, recipe_id: i64, user_id: i64) -> Result<()>;
    /// Returns whether a bookmark was removed.
    async fn unsave_for_user(&self, recipe_id: i64, user_id: i64) -> Result<bool>;
    async fn saved_for_user(&self, user_id: i64) -> Result<Vec<Recipe>>;
    async fn is_saved(&self, recipe_id: i64, user_id: i64) -> Result<bool>;
}

#[derive(Default)]
struct MemoryState {
    recipes: BTreeMap<i64, Recipe>,
    // (user_id, recipe_id)
    saved: BTreeSet<(i64, i64)>,
    next_id: i64,
}

/// Process-local repository; filtering runs through [`RecipeSearch::matches`].
#[derive(Default)]
pub struct InMemoryRecipeRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn all(&self) -> Result<Vec<Recipe>> {
        let state = self.state.read().await;
        Ok(state.recipes.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Recipe>> {
        let state = self.state.read().await;
        Ok(state.recipes.get(&id).cloned())
    }

    async fn search(&self, search: &RecipeSearch) -> Result<Vec<Recipe>> {
        let state = self.state.read().await;
        Ok(state
            .recipes
            .values()
            .filter(|recipe| search.matches(recipe))
            .cloned()
            .collect())
    }

    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe> {
        recipe.validate()?;
        let mut state = self.state.write().await;
        state.next_id += 1;
        let stored = recipe.into_recipe(state.next_id);
        state.recipes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save_for_user(&self, recipe_id: i64, user_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.recipes.contains_key(&recipe_id) {
            return Err(CatalogError::RecipeNotFound(recipe_id));
        }
        state.saved.insert((user_id, recipe_id));
        Ok(())
    }

    async fn unsave_for_user(&self, recipe_id: i64, user_id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.saved.remove(&(user_id, recipe_id)))
    }

    async fn saved_for_user(&self, user_id: i64) -> Result<Vec<Recipe>> {
        let state = self.state.read().await;
        Ok(state
            .saved
            .range((user_id, i64::MIN)..=(user_id, i64::MAX))
            .filter_map(|(_, recipe_id)| state.recipes.get(recipe_id).cloned())
            .collect())
    }

    async fn is_saved(&self, recipe_id: i64, user_id: i64) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.saved.contains(&(user_id, recipe_id)))
    }
}

const RECIPE_COLUMNS: &str = "id, name, ingredients, cooking_time, difficulty, pic";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recipes_recipe (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(120) NOT NULL,
    ingredients TEXT NOT NULL,
    cooking_time INTEGER NOT NULL,
    difficulty VARCHAR(20) NOT NULL,
    pic VARCHAR(100) NOT NULL DEFAULT 'no_image.jpg'
);
CREATE TABLE IF NOT EXISTS recipes_recipe_saved_by (
    id BIGSERIAL PRIMARY KEY,
    recipe_id BIGINT NOT NULL REFERENCES recipes_recipe (id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL,
    UNIQUE (recipe_id, user_id)
);
"#;

/// Repository over an established PostgreSQL connection.
pub struct PgRecipeRepository {
    conn: PgConnection,
}

impl PgRecipeRepository {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &PgConnection {
        &self.conn
    }

    /// Create the recipe and bookmark tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.conn.client().batch_execute(SCHEMA).await?;
        Ok(())
    }
}

fn recipe_from_row(row: &Row) -> Result<Recipe> {
    Ok(Recipe {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        ingredients: row.try_get("ingredients")?,
        cooking_time: row.try_get("cooking_time")?,
        difficulty: row.try_get("difficulty")?,
        pic: row.try_get("pic")?,
    })
}

fn recipes_from_rows(rows: &[Row]) -> Result<Vec<Recipe>> {
    rows.iter().map(recipe_from_row).collect()
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn all(&self) -> Result<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes_recipe ORDER BY id");
        let rows = self.conn.client().query(sql.as_str(), &[]).await?;
        recipes_from_rows(&rows)
    }

    async fn get(&self, id: i64) -> Result<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes_recipe WHERE id = $1");
        let row = self.conn.client().query_opt(sql.as_str(), &[&id]).await?;
        row.as_ref().map(recipe_from_row).transpose()
    }

    async fn search(&self, search: &RecipeSearch) -> Result<Vec<Recipe>> {
        // CASE keeps the integer cast away from non-numeric difficulties.
        let sql = format!(
            r#"
            SELECT {RECIPE_COLUMNS} FROM recipes_recipe
            WHERE ($1::INT IS NULL OR CASE
                    WHEN difficulty ~ '^\s*[0-9]{{1,3}}\s*$' THEN trim(difficulty)::INT <= $1
                    ELSE FALSE
                  END)
              AND cooking_time <= $2
              AND ($3::TEXT IS NULL OR name ILIKE $3)
              AND (cardinality($4::TEXT[]) = 0 OR ingredients ILIKE ANY ($4))
            ORDER BY id
            "#
        );
        let max_difficulty: Option<i32> = search.max_difficulty.map(i32::from);
        let title = search.title_pattern();
        let ingredients = search.ingredient_patterns();

        let rows = self
            .conn
            .client()
            .query(
                sql.as_str(),
                &[&max_difficulty, &search.max_cooking_time, &title, &ingredients],
            )
            .await?;
        recipes_from_rows(&rows)
    }

    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe> {
        recipe.validate()?;
        let sql = format!(
            "INSERT INTO recipes_recipe (name, ingredients, cooking_time, difficulty, pic) \
             VALUES ($1, $2, $3, $4, COALESCE($5::TEXT, 'no_image.jpg')) RETURNING {RECIPE_COLUMNS}"
        );
        let row = self
            .conn
            .client()
            .query_one(
                sql.as_str(),
                &[
                    &recipe.name,
                    &recipe.ingredients,
                    &recipe.cooking_time,
                    &recipe.difficulty,
                    &recipe.pic,
                ],
            )
            .await?;
        recipe_from_row(&row)
    }

    async fn save_for_user(&self, recipe_id: i64, user_id: i64) -> Result<()> {
        let inserted = self
            .conn
            .client()
            .execute(
                "INSERT INTO recipes_recipe_saved_by (recipe_id, user_id) \
                 SELECT id, $2::BIGINT FROM recipes_recipe WHERE id = $1 \
                 ON CONFLICT (recipe_id, user_id) DO NOTHING",
                &[&recipe_id, &user_id],
            )
            .await?;

        if inserted == 0 && self.get(recipe_id).await?.is_none() {
            return Err(CatalogError::RecipeNotFound(recipe_id));
        }
        Ok(())
    }

    async fn unsave_for_user(&self, recipe_id: i64, user_id: i64) -> Result<bool> {
        let removed = self
            .conn
            .client()
            .execute(
                "DELETE FROM recipes_recipe_saved_by WHERE recipe_id = $1 AND user_id = $2",
                &[&recipe_id, &user_id],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn saved_for_user(&self, user_id: i64) -> Result<Vec<Recipe>> {
        let rows = self
            .conn
            .client()
            .query(
                "SELECT r.id, r.name, r.ingredients, r.cooking_time, r.difficulty, r.pic \
                 FROM recipes_recipe r \
                 JOIN recipes_recipe_saved_by s ON s.recipe_id = r.id \
                 WHERE s.user_id = $1 ORDER BY r.id",
                &[&user_id],
            )
            .await?;
        recipes_from_rows(&rows)
    }

    async fn is_saved(&self, recipe_id: i64, user_id: i64) -> Result<bool> {
        let row = self
            .conn
            .client()
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM recipes_recipe_saved_by \
                 WHERE recipe_id = $1 AND user_id = $2)",
                &[&recipe_id, &user_id],
            )
            .await?;
        Ok(row.try_get(0)?)
    }
}
