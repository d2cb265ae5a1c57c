use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recipe_catalog::{
    AnalysisType, AsyncConnectionEstablisher, CatalogClient, ChartData, ChartType,
    ConnectionConfig, NewRecipe, PgConnector, Recipe, RecipeRepository, RecipeSearchForm,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recipe_catalog")]
#[command(about = "Recipe catalog tooling over a managed PostgreSQL database")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the `DATABASE_URL` / `DB_CONNECT_*` environment settings.
#[derive(Args)]
struct ConnectionArgs {
    #[arg(long, global = true)]
    url: Option<String>,
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
    #[arg(long, global = true)]
    backoff_factor: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// Establish a connection and report how it went
    Connect,
    /// List recipes, optionally filtered like the search form
    List {
        #[arg(long)]
        title: Option<String>,
        /// Comma-separated; matches recipes containing any of them
        #[arg(long)]
        ingredients: Option<String>,
        /// Maximum difficulty, 1-5
        #[arg(long)]
        difficulty: Option<String>,
        /// Maximum cooking time in minutes, 0-360
        #[arg(long)]
        max_time: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Store a new recipe
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        ingredients: String,
        #[arg(long)]
        cooking_time: i32,
        #[arg(long)]
        difficulty: String,
        #[arg(long)]
        pic: Option<String>,
    },
    /// Chart data for the analytics page
    Analytics {
        /// ingredients, difficulty or cooking_time
        #[arg(long)]
        analysis: String,
        /// bar, pie or line
        #[arg(long, default_value = "bar")]
        chart: String,
        #[arg(long)]
        json: bool,
    },
    /// Bookmark a recipe for a user
    Save { recipe_id: i64, user_id: i64 },
    /// Remove a bookmark
    Unsave { recipe_id: i64, user_id: i64 },
    /// List a user's bookmarked recipes
    Saved {
        user_id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.connection)?;

    match cli.command {
        Command::Connect => connect(&config).await,
        Command::List {
            title,
            ingredients,
            difficulty,
            max_time,
            json,
        } => {
            let form = RecipeSearchForm {
                recipe_title: title,
                recipe_ingredients: ingredients,
                difficulty_level: difficulty,
                cooking_time: max_time,
            };
            let client = open(&config).await?;
            let recipes = client.search(&form).await.context("Search failed")?;
            print_recipes(&recipes, json)
        }
        Command::Add {
            name,
            ingredients,
            cooking_time,
            difficulty,
            pic,
        } => {
            let mut recipe = NewRecipe::new(&name, &ingredients, cooking_time, &difficulty);
            if let Some(pic) = pic {
                recipe = recipe.pic(&pic);
            }
            let client = open(&config).await?;
            let stored = client.recipes().insert(recipe).await.context("Insert failed")?;
            println!("Added recipe {} ({})", stored.id, stored);
            Ok(())
        }
        Command::Analytics {
            analysis,
            chart,
            json,
        } => {
            let analysis: AnalysisType = analysis.parse()?;
            let chart: ChartType = chart.parse()?;
            let client = open(&config).await?;
            match client.analytics(analysis, chart).await? {
                Some(data) => print_chart(&data, json),
                None => {
                    println!("No recipes to analyze");
                    Ok(())
                }
            }
        }
        Command::Save { recipe_id, user_id } => {
            let client = open(&config).await?;
            client.recipes().save_for_user(recipe_id, user_id).await?;
            println!("Saved recipe {} for user {}", recipe_id, user_id);
            Ok(())
        }
        Command::Unsave { recipe_id, user_id } => {
            let client = open(&config).await?;
            if client.recipes().unsave_for_user(recipe_id, user_id).await? {
                println!("Removed recipe {} from user {}'s saved recipes", recipe_id, user_id);
            } else {
                println!("Recipe {} was not saved by user {}", recipe_id, user_id);
            }
            Ok(())
        }
        Command::Saved { user_id, json } => {
            let client = open(&config).await?;
            let recipes = client.recipes().saved_for_user(user_id).await?;
            print_recipes(&recipes, json)
        }
    }
}

fn load_config(args: &ConnectionArgs) -> Result<ConnectionConfig> {
    let mut config = ConnectionConfig::from_env().context("Failed to read connection settings")?;
    if let Some(url) = &args.url {
        config.url = url.clone();
    }
    if let Some(attempts) = args.max_attempts {
        config.max_attempts = attempts;
    }
    if let Some(factor) = args.backoff_factor {
        config.backoff_factor = factor;
    }
    config.validate()?;
    Ok(config)
}

async fn connect(config: &ConnectionConfig) -> Result<()> {
    let establisher = AsyncConnectionEstablisher::new(PgConnector::new(), config)?;
    let conn = establisher
        .establish(&config.url)
        .await
        .with_context(|| format!("Could not connect to {}", config.redacted_url()))?;

    println!(
        "Connected to {} (autocommit: {})",
        config.redacted_url(),
        conn.is_autocommit()
    );
    Ok(())
}

async fn open(config: &ConnectionConfig) -> Result<CatalogClient> {
    CatalogClient::connect(config)
        .await
        .with_context(|| format!("Could not open recipe catalog at {}", config.redacted_url()))
}

fn print_recipes(recipes: &[Recipe], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("No recipes found");
        return Ok(());
    }

    println!("{:>5}  {:<40}  {:>8}  {:<10}", "ID", "NAME", "MINUTES", "DIFFICULTY");
    for recipe in recipes {
        println!(
            "{:>5}  {:<40}  {:>8}  {:<10}",
            recipe.id, recipe.name, recipe.cooking_time, recipe.difficulty
        );
    }
    Ok(())
}

fn print_chart(data: &ChartData, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(data)?);
        return Ok(());
    }

    println!("{} ({} chart)", data.title, data.chart);
    if let (Some(x), Some(y)) = (&data.x_label, &data.y_label) {
        println!("{} / {}", x, y);
    }
    let total = data.total().max(1) as f64;
    for point in &data.points {
        if data.chart == ChartType::Pie {
            println!(
                "{:<24} {:>6}  {:>5.1}%",
                point.label,
                point.value,
                point.value as f64 * 100.0 / total
            );
        } else {
            println!("{:<24} {:>6}", point.label, point.value);
        }
    }
    Ok(())
}
