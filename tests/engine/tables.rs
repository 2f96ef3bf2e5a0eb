use crate::helpers::harness::with_test_db;
use pgmeta::engine::{CatalogDriver, ObjectDescriptor, ObjectType, PgCatalogDriver};

async fn connect(db: &crate::helpers::harness::TestDatabase) -> PgCatalogDriver {
    PgCatalogDriver::connect(&db.database_url())
        .await
        .expect("failed to connect catalog driver")
}

fn table_descriptor(schema: &str, name: &str) -> ObjectDescriptor {
    ObjectDescriptor {
        object_type: ObjectType::Table,
        schema: schema.to_string(),
        name: name.to_string(),
        owning_table: None,
        definition: None,
    }
}

#[tokio::test]
async fn single_table_renders_columns_and_primary_key() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int PRIMARY KEY, email text NOT NULL)")
            .await;

        let driver = connect(db).await;
        let ddl = driver
            .fetch_definition(&table_descriptor("public", "users"))
            .await
            .unwrap();

        assert_eq!(
            ddl,
            "CREATE TABLE public.users (\n    id integer NOT NULL,\n    email text NOT NULL,\n    PRIMARY KEY (id)\n);"
        );
    })
    .await;
}

#[tokio::test]
async fn mixed_case_identifier_is_quoted_in_ddl() {
    with_test_db(async |db| {
        db.execute(r#"CREATE TABLE "Orders" (id int PRIMARY KEY)"#).await;

        let driver = connect(db).await;
        let ddl = driver
            .fetch_definition(&table_descriptor("public", "Orders"))
            .await
            .unwrap();

        assert!(ddl.starts_with("CREATE TABLE public.\"Orders\" ("));
    })
    .await;
}

#[tokio::test]
async fn foreign_keys_on_the_same_column_are_aggregated_and_deduplicated() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE users (id int PRIMARY KEY)").await;
        db.execute("CREATE TABLE orders (user_id int)").await;
        db.execute(
            "ALTER TABLE orders ADD CONSTRAINT fk_a FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE",
        )
        .await;

        let driver = connect(db).await;
        let ddl = driver
            .fetch_definition(&table_descriptor("public", "orders"))
            .await
            .unwrap();

        assert!(ddl.contains("fk_tbl_users_col_user_id"));
        assert!(ddl.contains("ON DELETE CASCADE"));
        // Exactly one FK clause appears on the column line, not duplicated.
        assert_eq!(ddl.matches("fk_tbl_users_col_user_id").count(), 1);
    })
    .await;
}

#[tokio::test]
async fn varchar_and_numeric_columns_render_their_size() {
    with_test_db(async |db| {
        db.execute("CREATE TABLE prices (code varchar(8), amount numeric(10,2))")
            .await;

        let driver = connect(db).await;
        let ddl = driver
            .fetch_definition(&table_descriptor("public", "prices"))
            .await
            .unwrap();

        assert!(ddl.contains("character varying(8)"));
        assert!(ddl.contains("numeric(10,2)"));
    })
    .await;
}

#[tokio::test]
async fn missing_table_is_no_such_object() {
    with_test_db(async |db| {
        let driver = connect(db).await;
        let err = driver
            .fetch_definition(&table_descriptor("public", "ghost"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            pgmeta::engine::EngineError::NoSuchObject { .. }
        ));
    })
    .await;
}
