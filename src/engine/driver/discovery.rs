//! Per-type discovery queries (§4.1 table). Each returns bare
//! `(name[, owning_table[, definition]])` tuples; the Planner applies the
//! name-pattern regex and deduplicates in memory.

use sqlx::{PgPool, Row};

use super::RawDiscoveryRow;
use crate::engine::error::EngineError;
use crate::engine::types::ObjectType;

pub async fn discover(
    pool: &PgPool,
    object_type: ObjectType,
    schema: &str,
) -> Result<Vec<RawDiscoveryRow>, EngineError> {
    match object_type {
        ObjectType::Table => simple_names(pool, TABLE_QUERY, schema).await,
        ObjectType::View => simple_names(pool, VIEW_QUERY, schema).await,
        ObjectType::MaterializedView => simple_names(pool, MATVIEW_QUERY, schema).await,
        ObjectType::Function => simple_names(pool, FUNCTION_QUERY, schema).await,
        ObjectType::Procedure => simple_names(pool, PROCEDURE_QUERY, schema).await,
        ObjectType::Aggregate => simple_names(pool, AGGREGATE_QUERY, schema).await,
        ObjectType::Extension => simple_names(pool, EXTENSION_QUERY, schema).await,
        ObjectType::Trigger => owned_names(pool, TRIGGER_QUERY, schema).await,
        ObjectType::Index => owned_names(pool, INDEX_QUERY, schema).await,
        ObjectType::Policy => owned_names(pool, POLICY_QUERY, schema).await,
        ObjectType::Rule => owned_names(pool, RULE_QUERY, schema).await,
        ObjectType::Sequence => owned_names(pool, SEQUENCE_QUERY, schema).await,
        ObjectType::Constraint => constraints(pool, schema).await,
        ObjectType::Publication | ObjectType::Subscription => {
            // Database-wide types are never queried per-schema; the
            // Planner routes these through `discover_database_wide`
            // exactly once per run (§4.2).
            Ok(Vec::new())
        }
    }
}

pub async fn discover_database_wide(
    pool: &PgPool,
    object_type: ObjectType,
) -> Result<Vec<RawDiscoveryRow>, EngineError> {
    let query = match object_type {
        ObjectType::Publication => PUBLICATION_QUERY,
        ObjectType::Subscription => SUBSCRIPTION_QUERY,
        other => {
            return Err(EngineError::UnsupportedType(format!(
                "{other:?} is not a database-wide object type"
            )));
        }
    };

    let rows = sqlx::query(query)
        .fetch_all(pool)
        .await
        .map_err(EngineError::Query)?;

    Ok(rows
        .into_iter()
        .map(|row| RawDiscoveryRow {
            schema: crate::engine::types::DATABASE_WIDE_SCHEMA.to_string(),
            name: row.get("name"),
            owning_table: None,
            definition: None,
        })
        .collect())
}

async fn simple_names(
    pool: &PgPool,
    query: &str,
    schema: &str,
) -> Result<Vec<RawDiscoveryRow>, EngineError> {
    let rows = sqlx::query(query)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(EngineError::Query)?;

    Ok(rows
        .into_iter()
        .map(|row| RawDiscoveryRow {
            schema: schema.to_string(),
            name: row.get("name"),
            owning_table: None,
            definition: None,
        })
        .collect())
}

async fn owned_names(
    pool: &PgPool,
    query: &str,
    schema: &str,
) -> Result<Vec<RawDiscoveryRow>, EngineError> {
    let rows = sqlx::query(query)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(EngineError::Query)?;

    Ok(rows
        .into_iter()
        .map(|row| RawDiscoveryRow {
            schema: schema.to_string(),
            name: row.get("name"),
            owning_table: row.get("owning_table"),
            definition: None,
        })
        .collect())
}

async fn constraints(pool: &PgPool, schema: &str) -> Result<Vec<RawDiscoveryRow>, EngineError> {
    let rows = sqlx::query(CONSTRAINT_QUERY)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(EngineError::Query)?;

    Ok(rows
        .into_iter()
        .map(|row| RawDiscoveryRow {
            schema: schema.to_string(),
            name: row.get("name"),
            owning_table: row.get("owning_table"),
            definition: row.get("definition"),
        })
        .collect())
}

const TABLE_QUERY: &str = r#"
    SELECT table_name AS name
    FROM information_schema.tables
    WHERE table_schema = $1 AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const VIEW_QUERY: &str = r#"
    SELECT table_name AS name
    FROM information_schema.tables
    WHERE table_schema = $1 AND table_type = 'VIEW'
    ORDER BY table_name
"#;

const MATVIEW_QUERY: &str = r#"
    SELECT c.relname AS name
    FROM pg_class c
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1 AND c.relkind = 'm'
    ORDER BY c.relname
"#;

const FUNCTION_QUERY: &str = r#"
    SELECT p.proname AS name
    FROM pg_proc p
    JOIN pg_namespace n ON p.pronamespace = n.oid
    WHERE n.nspname = $1 AND p.prokind = 'f'
    ORDER BY p.proname
"#;

const PROCEDURE_QUERY: &str = r#"
    SELECT p.proname AS name
    FROM pg_proc p
    JOIN pg_namespace n ON p.pronamespace = n.oid
    WHERE n.nspname = $1 AND p.prokind = 'p'
    ORDER BY p.proname
"#;

const AGGREGATE_QUERY: &str = r#"
    SELECT p.proname AS name
    FROM pg_proc p
    JOIN pg_namespace n ON p.pronamespace = n.oid
    WHERE n.nspname = $1 AND p.prokind = 'a'
    ORDER BY p.proname
"#;

const EXTENSION_QUERY: &str = r#"
    SELECT e.extname AS name
    FROM pg_extension e
    JOIN pg_namespace n ON e.extnamespace = n.oid
    WHERE n.nspname = $1
    ORDER BY e.extname
"#;

const TRIGGER_QUERY: &str = r#"
    SELECT t.tgname AS name, c.relname AS owning_table
    FROM pg_trigger t
    JOIN pg_class c ON t.tgrelid = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1 AND NOT t.tgisinternal
    ORDER BY c.relname, t.tgname
"#;

const INDEX_QUERY: &str = r#"
    SELECT ic.relname AS name, tc.relname AS owning_table
    FROM pg_index i
    JOIN pg_class ic ON i.indexrelid = ic.oid
    JOIN pg_class tc ON i.indrelid = tc.oid
    JOIN pg_namespace n ON ic.relnamespace = n.oid
    WHERE n.nspname = $1 AND tc.relkind = 'r'
    ORDER BY tc.relname, ic.relname
"#;

const POLICY_QUERY: &str = r#"
    SELECT p.polname AS name, c.relname AS owning_table
    FROM pg_policy p
    JOIN pg_class c ON p.polrelid = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1
    ORDER BY c.relname, p.polname
"#;

const RULE_QUERY: &str = r#"
    SELECT r.rulename AS name, c.relname AS owning_table
    FROM pg_rewrite r
    JOIN pg_class c ON r.ev_class = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1 AND r.rulename <> '_RETURN'
    ORDER BY c.relname, r.rulename
"#;

const SEQUENCE_QUERY: &str = r#"
    SELECT s.sequence_name AS name, own.owning_table
    FROM information_schema.sequences s
    JOIN pg_namespace n ON n.nspname = s.sequence_schema
    JOIN pg_class c ON c.relname = s.sequence_name AND c.relnamespace = n.oid
    LEFT JOIN LATERAL (
        SELECT tc.relname AS owning_table
        FROM pg_depend d
        JOIN pg_class tc ON d.refobjid = tc.oid
        WHERE d.objid = c.oid AND d.deptype = 'a' AND d.refobjsubid > 0
        LIMIT 1
    ) own ON true
    WHERE s.sequence_schema = $1
    ORDER BY s.sequence_name
"#;

const CONSTRAINT_QUERY: &str = r#"
    SELECT
        con.conname AS name,
        c.relname AS owning_table,
        pg_get_constraintdef(con.oid) AS definition
    FROM pg_constraint con
    JOIN pg_class c ON con.conrelid = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1 AND con.contype IN ('p', 'f', 'u', 'c')
    ORDER BY c.relname, con.conname
"#;

const PUBLICATION_QUERY: &str = "SELECT pubname AS name FROM pg_publication ORDER BY pubname";

const SUBSCRIPTION_QUERY: &str = "SELECT subname AS name FROM pg_subscription ORDER BY subname";
