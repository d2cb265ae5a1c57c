// ============================================================================
// Recipe Catalog Library
// ============================================================================

pub mod core;
pub mod interface;
pub mod connection;
pub mod recipes;

// Re-export main types for convenience
pub use crate::core::{CatalogError, ConnectFailure, Result};
pub use interface::{AsyncConnector, Connector};

// Re-export connection API
pub use connection::{
    AsyncConnectionEstablisher,
    ConnectionEstablisher,
    config::ConnectionConfig,
    backoff::{BackoffSchedule, Sleeper, AsyncSleeper, ThreadSleeper, TokioSleeper},
    observer::{ConnectObserver, EventLevel, LogObserver, RecordingObserver},
    postgres::{PgConnection, PgConnector},
};

// Re-export recipe API
pub use recipes::{
    AnalysisType, ChartData, ChartType, InMemoryRecipeRepository, NewRecipe, PgRecipeRepository,
    Recipe, RecipeRepository, RecipeSearch, RecipeSearchForm,
};

// ============================================================================
// High-level Client API
// ============================================================================

/// Recipe catalog client backed by PostgreSQL
///
/// Connects through [`AsyncConnectionEstablisher`], so a saturated or
/// rate-limited server is retried with jittered exponential backoff before
/// the caller ever sees an error.
///
/// # Examples
///
/// ```no_run
/// use recipe_catalog::{CatalogClient, ConnectionConfig, RecipeRepository};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConnectionConfig::from_env()?;
/// let client = CatalogClient::connect(&config).await?;
///
/// for recipe in client.recipes().all().await? {
///     println!("{}", recipe);
/// }
/// # Ok(())
/// # }
/// ```
pub struct CatalogClient {
    repository: PgRecipeRepository,
}

impl CatalogClient {
    /// Establish a connection and make sure the recipe tables exist
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let establisher = AsyncConnectionEstablisher::new(PgConnector::new(), config)?;
        let conn = establisher.establish(&config.url).await?;

        let repository = PgRecipeRepository::new(conn);
        repository.ensure_schema().await?;
        Ok(Self { repository })
    }

    /// Recipe storage and bookmarks
    pub fn recipes(&self) -> &PgRecipeRepository {
        &self.repository
    }

    /// Run a search form against the stored recipes
    pub async fn search(&self, form: &RecipeSearchForm) -> Result<Vec<Recipe>> {
        let search = form.clean()?;
        self.repository.search(&search).await
    }

    /// Chart data over every stored recipe
    pub async fn analytics(
        &self,
        analysis: AnalysisType,
        chart: ChartType,
    ) -> Result<Option<ChartData>> {
        let recipes = self.repository.all().await?;
        Ok(recipes::analyze(analysis, chart, &recipes))
    }
}
