//! Runs against a real server when `TEST_DATABASE_URL` is set; otherwise the
//! database-backed tests return early.

use recipe_catalog::{
    AsyncConnectionEstablisher, CatalogClient, ConnectionConfig, EventLevel, NewRecipe,
    PgConnector, RecipeRepository, RecipeSearchForm, RecordingObserver,
};

fn test_database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            None
        }
    }
}

#[tokio::test]
async fn test_refused_port_is_retried_then_returned() {
    // Nothing listens on port 1.
    let config = ConnectionConfig::new("host=127.0.0.1 port=1 user=postgres dbname=recipes")
        .max_attempts(2)
        .backoff_factor(0.01)
        .jitter_ceiling(0.0);
    let observer = RecordingObserver::new();
    let establisher = AsyncConnectionEstablisher::new(PgConnector::new(), &config)
        .unwrap()
        .with_observer(observer.clone());

    let err = match establisher.establish(&config.url).await {
        Ok(_) => panic!("nothing should be listening on port 1"),
        Err(err) => err,
    };

    assert!(err.is_retryable());
    assert_eq!(observer.messages_at(EventLevel::Warn).len(), 1);
    assert_eq!(observer.messages_at(EventLevel::Error).len(), 1);
}

#[tokio::test]
async fn test_establish_gives_autocommit_connection() {
    let Some(url) = test_database_url() else { return };
    let config = ConnectionConfig::new(&url).max_attempts(3);
    let establisher = AsyncConnectionEstablisher::new(PgConnector::new(), &config).unwrap();

    let conn = establisher.establish(&url).await.unwrap();

    assert!(conn.is_autocommit());
    assert!(!conn.is_closed());
    conn.ping().await.unwrap();
}

#[tokio::test]
async fn test_catalog_client_round_trip() {
    let Some(url) = test_database_url() else { return };
    let config = ConnectionConfig::new(&url).max_attempts(3);
    let client = CatalogClient::connect(&config).await.unwrap();
    let repo = client.recipes();

    let marker = format!("Pg Test {}", std::process::id());
    let stored = repo
        .insert(NewRecipe::new(&marker, "flour, water, yeast", 240, "2"))
        .await
        .unwrap();
    assert_eq!(stored.pic, "no_image.jpg");
    assert_eq!(repo.get(stored.id).await.unwrap(), Some(stored.clone()));

    let form = RecipeSearchForm {
        recipe_title: Some(marker.to_lowercase()),
        recipe_ingredients: Some("YEAST".into()),
        difficulty_level: Some("3".into()),
        cooking_time: Some(300),
    };
    let found = client.search(&form).await.unwrap();
    assert_eq!(found, vec![stored.clone()]);

    let user_id = i64::from(std::process::id());
    repo.save_for_user(stored.id, user_id).await.unwrap();
    repo.save_for_user(stored.id, user_id).await.unwrap();
    assert!(repo.is_saved(stored.id, user_id).await.unwrap());
    assert_eq!(repo.saved_for_user(user_id).await.unwrap(), vec![stored.clone()]);
    assert!(repo.unsave_for_user(stored.id, user_id).await.unwrap());
    assert!(!repo.is_saved(stored.id, user_id).await.unwrap());

    repo.connection()
        .client()
        .execute("DELETE FROM recipes_recipe WHERE id = $1", &[&stored.id])
        .await
        .unwrap();
}
