use crate::helpers::harness::with_test_db;
use pgmeta::engine::{CatalogDriver, ObjectDescriptor, ObjectType, PgCatalogDriver};

fn descriptor(object_type: ObjectType, name: &str) -> ObjectDescriptor {
    ObjectDescriptor {
        object_type,
        schema: "public".to_string(),
        name: name.to_string(),
        owning_table: None,
        definition: None,
    }
}

#[tokio::test]
async fn view_definition_is_fetched_from_information_schema() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int, active boolean)").await;
        db.execute("CREATE VIEW active_users AS SELECT id FROM users WHERE active")
            .await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let ddl = driver
            .fetch_definition(&descriptor(ObjectType::View, "active_users"))
            .await
            .unwrap();

        assert!(ddl.starts_with("CREATE VIEW public.active_users AS"));
        assert!(ddl.contains("FROM users"));
    })
    .await;
}

#[tokio::test]
async fn materialized_view_definition_includes_prefix() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int)").await;
        db.execute("CREATE MATERIALIZED VIEW user_counts AS SELECT count(*) FROM users")
            .await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let ddl = driver
            .fetch_definition(&descriptor(ObjectType::MaterializedView, "user_counts"))
            .await
            .unwrap();

        assert!(ddl.starts_with("CREATE MATERIALIZED VIEW public.user_counts AS"));
    })
    .await;
}

#[tokio::test]
async fn function_definition_round_trips_through_pg_get_functiondef() {
    with_test_db(async |db| {
        db.execute(
            "CREATE FUNCTION double_it(n int) RETURNS int AS $$ SELECT n * 2 $$ LANGUAGE SQL",
        )
        .await;

        let driver = PgCatalogDriver::connect(&db.database_url()).await.unwrap();
        let ddl = driver
            .fetch_definition(&descriptor(ObjectType::Function, "double_it"))
            .await
            .unwrap();

        assert!(ddl.starts_with("CREATE OR REPLACE FUNCTION"));
        assert!(ddl.contains("double_it"));
    })
    .await;
}
