pub mod analytics;
pub mod model;
pub mod repository;
pub mod search;

pub use analytics::{AnalysisType, ChartData, ChartType, DataPoint, analyze};
pub use model::{NewRecipe, Recipe};
pub use repository::{InMemoryRecipeRepository, PgRecipeRepository, RecipeRepository};
pub use search::{RecipeSearch, RecipeSearchForm};
