use crate::helpers::harness::with_test_db;
use pgmeta::engine::{facade, Budgets, ErrorPolicy, ObjectType, PgCatalogDriver, Request};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn table_request(pattern: &str) -> Request {
    let mut types = BTreeSet::new();
    types.insert(ObjectType::Table);
    Request {
        types,
        schemas: vec!["public".to_string()],
        name_pattern: pattern.to_string(),
    }
}

#[tokio::test]
async fn end_to_end_export_writes_table_sql_under_schema_tree() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int PRIMARY KEY, email text NOT NULL)")
            .await;

        let driver: Arc<dyn pgmeta::engine::CatalogDriver> = Arc::new(
            PgCatalogDriver::connect(&db.database_url()).await.unwrap(),
        );
        let out_dir = tempfile::tempdir().unwrap();

        let outcome = facade::export(
            driver,
            table_request("users"),
            out_dir.path(),
            ErrorPolicy::FailFast,
            Budgets::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        match outcome {
            pgmeta::engine::ExportOutcome::Completed(summary) => {
                assert_eq!(summary.discovered, 1);
                assert_eq!(summary.written, 1);
            }
            other => panic!("expected Completed, got {other:?}"),
        }

        let written = std::fs::read_to_string(out_dir.path().join("public/tables/users/table.sql"))
            .unwrap();
        assert!(written.starts_with("CREATE TABLE public.users ("));
    })
    .await;
}

#[tokio::test]
async fn non_matching_pattern_yields_no_objects_found_without_creating_output() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int)").await;

        let driver: Arc<dyn pgmeta::engine::CatalogDriver> = Arc::new(
            PgCatalogDriver::connect(&db.database_url()).await.unwrap(),
        );
        let out_dir = tempfile::tempdir().unwrap();
        let output_root = out_dir.path().join("export");

        let outcome = facade::export(
            driver,
            table_request("^nonexistent$"),
            &output_root,
            ErrorPolicy::FailFast,
            Budgets::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, pgmeta::engine::ExportOutcome::NoObjectsFound);
        assert!(!output_root.exists());
    })
    .await;
}

#[tokio::test]
async fn indexes_and_constraints_nest_under_the_owning_table_directory() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE accounts (id int PRIMARY KEY, email text)").await;
        db.execute("CREATE INDEX accounts_email_idx ON accounts (email)").await;

        let mut types = BTreeSet::new();
        types.insert(ObjectType::Table);
        types.insert(ObjectType::Index);
        types.insert(ObjectType::Constraint);
        let request = Request {
            types,
            schemas: vec!["public".to_string()],
            name_pattern: "ALL".to_string(),
        };

        let driver: Arc<dyn pgmeta::engine::CatalogDriver> = Arc::new(
            PgCatalogDriver::connect(&db.database_url()).await.unwrap(),
        );
        let out_dir = tempfile::tempdir().unwrap();

        facade::export(
            driver,
            request,
            out_dir.path(),
            ErrorPolicy::FailFast,
            Budgets::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(out_dir.path().join("public/tables/accounts/table.sql").exists());
        assert!(out_dir
            .path()
            .join("public/tables/accounts/indexes/accounts_email_idx.sql")
            .exists());
        assert!(out_dir
            .path()
            .join("public/tables/accounts/constraints/accounts_pkey.sql")
            .exists());
    })
    .await;
}
