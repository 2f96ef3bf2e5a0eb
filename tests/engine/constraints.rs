use crate::helpers::harness::with_test_db;
use pgmeta::engine::{CatalogDriver, ObjectType, PgCatalogDriver, Request};
use std::collections::BTreeSet;

#[tokio::test]
async fn constraint_definitions_are_populated_at_discovery_time() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int, email text, CONSTRAINT users_email_uk UNIQUE (email))")
            .await;

        let driver: std::sync::Arc<dyn CatalogDriver> = std::sync::Arc::new(
            PgCatalogDriver::connect(&db.database_url()).await.unwrap(),
        );

        let mut types = BTreeSet::new();
        types.insert(ObjectType::Constraint);
        let request = Request {
            types,
            schemas: vec!["public".to_string()],
            name_pattern: "users_email_uk".to_string(),
        };

        let descriptors = pgmeta::engine::planner::discover(driver.as_ref(), &request)
            .await
            .unwrap();

        assert_eq!(descriptors.len(), 1);
        let constraint = &descriptors[0];
        assert_eq!(constraint.owning_table.as_deref(), Some("users"));
        let definition = constraint.definition.as_deref().unwrap();
        assert!(definition.contains("UNIQUE"));
        assert!(definition.contains("email"));
    })
    .await;
}
