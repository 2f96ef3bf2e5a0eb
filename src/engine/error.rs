//! Closed error taxonomy for the extraction engine.
//!
//! Unlike the rest of the crate, which propagates `anyhow::Error` with
//! contextual messages at each boundary, the engine needs to distinguish a
//! handful of error *kinds* programmatically (fatal vs. policy-dependent) so
//! the facade can decide whether to escalate. `thiserror` gives us that
//! without hand-rolling `Display`/`Error` impls.

use std::path::PathBuf;

use crate::engine::types::ObjectType;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to connect to database")]
    Connection(#[source] sqlx::Error),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid name pattern")]
    InvalidRegex(#[source] regex::Error),

    #[error("catalog query failed")]
    Query(#[source] sqlx::Error),

    #[error("no such object: {schema}.{name} ({object_type:?})")]
    NoSuchObject {
        schema: String,
        name: String,
        object_type: ObjectType,
    },

    #[error("definition was null for {schema}.{name} ({object_type:?})")]
    NullDefinition {
        schema: String,
        name: String,
        object_type: ObjectType,
    },

    #[error("unsupported object type: {0}")]
    UnsupportedType(String),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} object definition(s) failed to fetch and policy is fail-fast: {}", .0.len(), .0.join(", "))]
    PartialDefinitionFailure(Vec<String>),
}

impl EngineError {
    /// True for error kinds that are always fatal regardless of the
    /// configured `ErrorPolicy` (§7: `SchemaNotFound`, `InvalidRegex`,
    /// `Connection`, and `UnsupportedType` are never downgraded).
    pub fn is_always_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Connection(_)
                | EngineError::SchemaNotFound(_)
                | EngineError::InvalidRegex(_)
                | EngineError::UnsupportedType(_)
        )
    }
}
