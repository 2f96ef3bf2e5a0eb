use crate::helpers::harness::with_test_db;
use pgmeta::engine::{CatalogDriver, PgCatalogDriver};

#[tokio::test]
async fn list_schemas_excludes_system_schemas() {
    with_test_db(async |db| {
        db.execute("CREATE SCHEMA app").await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let schemas = driver.list_schemas().await.unwrap();

        assert!(schemas.contains(&"public".to_string()));
        assert!(schemas.contains(&"app".to_string()));
        assert!(!schemas.iter().any(|s| s.starts_with("pg_")));
        assert!(!schemas.contains(&"information_schema".to_string()));
    })
    .await;
}

#[tokio::test]
async fn schema_exists_reflects_catalog_state() {
    with_test_db(async |db| {
        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();

        assert!(driver.schema_exists("public").await.unwrap());
        assert!(!driver.schema_exists("does_not_exist").await.unwrap());
    })
    .await;
}
