//! The Discovery Planner (§4.2): resolves a [`Request`] into a deduplicated
//! list of [`ObjectDescriptor`]s, without touching definitions.

use std::collections::BTreeSet;

use regex::Regex;

use crate::engine::driver::CatalogDriver;
use crate::engine::error::EngineError;
use crate::engine::types::{ObjectDescriptor, ObjectType, Request};

pub async fn discover(
    driver: &dyn CatalogDriver,
    request: &Request,
) -> Result<Vec<ObjectDescriptor>, EngineError> {
    let schemas = resolve_schemas(driver, request).await?;
    let pattern = Regex::new(request.effective_pattern()).map_err(EngineError::InvalidRegex)?;
    let types = request.effective_types();

    let mut seen: BTreeSet<(ObjectType, String, String)> = BTreeSet::new();
    let mut descriptors = Vec::new();

    for schema in &schemas {
        for object_type in &types {
            if object_type.is_database_wide() {
                continue;
            }
            let rows = driver.discover(*object_type, schema).await?;
            for row in rows {
                if !pattern.is_match(&row.name) {
                    continue;
                }
                let key = (*object_type, row.schema.clone(), row.name.clone());
                if !seen.insert(key) {
                    continue;
                }
                descriptors.push(ObjectDescriptor {
                    object_type: *object_type,
                    schema: row.schema,
                    name: row.name,
                    owning_table: row.owning_table,
                    definition: row.definition,
                });
            }
        }
    }

    for object_type in &types {
        if !object_type.is_database_wide() {
            continue;
        }
        let rows = driver.discover_database_wide(*object_type).await?;
        for row in rows {
            if !pattern.is_match(&row.name) {
                continue;
            }
            let key = (*object_type, row.schema.clone(), row.name.clone());
            if !seen.insert(key) {
                continue;
            }
            descriptors.push(ObjectDescriptor {
                object_type: *object_type,
                schema: row.schema,
                name: row.name,
                owning_table: row.owning_table,
                definition: row.definition,
            });
        }
    }

    Ok(descriptors)
}

async fn resolve_schemas(
    driver: &dyn CatalogDriver,
    request: &Request,
) -> Result<Vec<String>, EngineError> {
    if request.is_all_schemas() {
        return driver.list_schemas().await;
    }

    let schemas = request.schemas_or_default();
    for schema in &schemas {
        if !driver.schema_exists(schema).await? {
            return Err(EngineError::SchemaNotFound(schema.clone()));
        }
    }
    Ok(schemas)
}
