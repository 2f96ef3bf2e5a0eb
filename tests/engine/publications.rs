use crate::helpers::harness::with_test_db;
use pgmeta::engine::{CatalogDriver, ObjectDescriptor, ObjectType, PgCatalogDriver};

#[tokio::test]
async fn publication_for_all_tables_is_discovered_under_synthetic_schema() {
    with_test_db(async |db| {
        db.execute("CREATE PUBLICATION all_tables_pub FOR ALL TABLES").await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let rows = driver
            .discover_database_wide(ObjectType::Publication)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].schema, "postgres");
        assert_eq!(rows[0].name, "all_tables_pub");

        let descriptor = ObjectDescriptor {
            object_type: ObjectType::Publication,
            schema: rows[0].schema.clone(),
            name: rows[0].name.clone(),
            owning_table: None,
            definition: None,
        };
        let ddl = driver.fetch_definition(&descriptor).await.unwrap();
        assert_eq!(ddl, "CREATE PUBLICATION all_tables_pub FOR ALL TABLES;");
    })
    .await;
}

#[tokio::test]
async fn publication_for_explicit_tables_lists_them_schema_qualified() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int)").await;
        db.execute("CREATE PUBLICATION users_pub FOR TABLE users").await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let descriptor = ObjectDescriptor {
            object_type: ObjectType::Publication,
            schema: "postgres".to_string(),
            name: "users_pub".to_string(),
            owning_table: None,
            definition: None,
        };
        let ddl = driver.fetch_definition(&descriptor).await.unwrap();

        assert_eq!(ddl, "CREATE PUBLICATION users_pub FOR TABLE public.users;");
    })
    .await;
}
