//! Core data model shared by the Planner, Fetcher, and Exporter.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Closed enumeration of every catalog object the engine knows how to
/// discover and export. Dispatch over this type is always an exhaustive
/// `match` — adding a variant is meant to force a compile error at every
/// site that needs updating (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectType {
    Table,
    View,
    MaterializedView,
    Function,
    Procedure,
    Aggregate,
    Trigger,
    Index,
    Constraint,
    Sequence,
    Policy,
    Extension,
    Publication,
    Subscription,
    Rule,
}

impl ObjectType {
    pub const ALL: [ObjectType; 15] = [
        ObjectType::Table,
        ObjectType::View,
        ObjectType::MaterializedView,
        ObjectType::Function,
        ObjectType::Procedure,
        ObjectType::Aggregate,
        ObjectType::Trigger,
        ObjectType::Index,
        ObjectType::Constraint,
        ObjectType::Sequence,
        ObjectType::Policy,
        ObjectType::Extension,
        ObjectType::Publication,
        ObjectType::Subscription,
        ObjectType::Rule,
    ];

    /// True for the two object types that live at the database level rather
    /// than within a schema; the Planner queries these once per run instead
    /// of once per resolved schema.
    pub fn is_database_wide(self) -> bool {
        matches!(self, ObjectType::Publication | ObjectType::Subscription)
    }

    /// True for object types that are normally nested under an owning
    /// table in the output tree (§4.4). Used by the Exporter to decide
    /// whether a missing `owning_table` deserves a warning.
    pub fn expects_owning_table(self) -> bool {
        matches!(
            self,
            ObjectType::Trigger
                | ObjectType::Index
                | ObjectType::Constraint
                | ObjectType::Policy
                | ObjectType::Rule
        )
    }

    /// The plural directory-name fragment used when placing this type's
    /// files (e.g. `Trigger` -> "triggers").
    pub fn plural_dir_name(self) -> &'static str {
        match self {
            ObjectType::Table => "tables",
            ObjectType::View => "views",
            ObjectType::MaterializedView => "materialized_views",
            ObjectType::Function => "functions",
            ObjectType::Procedure => "procedures",
            ObjectType::Aggregate => "aggregates",
            ObjectType::Trigger => "triggers",
            ObjectType::Index => "indexes",
            ObjectType::Constraint => "constraints",
            ObjectType::Sequence => "sequences",
            ObjectType::Policy => "policies",
            ObjectType::Extension => "extensions",
            ObjectType::Publication => "publications",
            ObjectType::Subscription => "subscriptions",
            ObjectType::Rule => "rules",
        }
    }

    /// Parses the comma-separated `--types` CLI value (case-insensitive,
    /// accepting the same spelling as `plural_dir_name` singularized, plus
    /// a couple of natural aliases).
    pub fn parse(raw: &str) -> Result<ObjectType, crate::engine::error::EngineError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "table" | "tables" => Ok(ObjectType::Table),
            "view" | "views" => Ok(ObjectType::View),
            "materialized_view" | "materialized_views" | "materializedview" => {
                Ok(ObjectType::MaterializedView)
            }
            "function" | "functions" => Ok(ObjectType::Function),
            "procedure" | "procedures" => Ok(ObjectType::Procedure),
            "aggregate" | "aggregates" => Ok(ObjectType::Aggregate),
            "trigger" | "triggers" => Ok(ObjectType::Trigger),
            "index" | "indexes" | "indices" => Ok(ObjectType::Index),
            "constraint" | "constraints" => Ok(ObjectType::Constraint),
            "sequence" | "sequences" => Ok(ObjectType::Sequence),
            "policy" | "policies" => Ok(ObjectType::Policy),
            "extension" | "extensions" => Ok(ObjectType::Extension),
            "publication" | "publications" => Ok(ObjectType::Publication),
            "subscription" | "subscriptions" => Ok(ObjectType::Subscription),
            "rule" | "rules" => Ok(ObjectType::Rule),
            other => Err(crate::engine::error::EngineError::UnsupportedType(
                other.to_string(),
            )),
        }
    }
}

/// The synthetic schema bucket used for database-level objects
/// (`Publication`, `Subscription`) so the directory-partitioning logic
/// always has a stable bucket to write into (§3).
pub const DATABASE_WIDE_SCHEMA: &str = "postgres";

/// The unit of work threaded through Planner -> Fetcher -> Exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub object_type: ObjectType,
    pub schema: String,
    pub name: String,
    pub owning_table: Option<String>,
    pub definition: Option<String>,
}

impl ObjectDescriptor {
    /// The `(object_type, schema, name)` triple that uniquely identifies
    /// this object within one export run (§3 invariant).
    pub fn identity(&self) -> (ObjectType, &str, &str) {
        (self.object_type, self.schema.as_str(), self.name.as_str())
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// The Planner input (§3).
#[derive(Debug, Clone)]
pub struct Request {
    pub types: BTreeSet<ObjectType>,
    pub schemas: Vec<String>,
    pub name_pattern: String,
}

impl Request {
    /// The sentinel used for "every schema" / "every type" / "match
    /// everything" across `schemas` and `name_pattern`.
    pub const ALL_SENTINEL: &'static str = "ALL";

    /// Types to actually query: the closed enum in declaration order when
    /// the request's `types` is empty ("all types"), otherwise exactly the
    /// requested set.
    pub fn effective_types(&self) -> Vec<ObjectType> {
        if self.types.is_empty() {
            ObjectType::ALL.to_vec()
        } else {
            self.types.iter().copied().collect()
        }
    }

    /// Schemas as given, with the empty-defaults-to-public rule applied.
    /// Does NOT resolve the `"ALL"` sentinel — that requires a catalog
    /// round-trip and is the Planner's job (§4.2).
    pub fn schemas_or_default(&self) -> Vec<String> {
        if self.schemas.is_empty() {
            vec!["public".to_string()]
        } else {
            self.schemas.clone()
        }
    }

    pub fn is_all_schemas(&self) -> bool {
        self.schemas == [Self::ALL_SENTINEL.to_string()]
    }

    /// The regex source, with the `"ALL"` sentinel translated to `.*`.
    pub fn effective_pattern(&self) -> &str {
        if self.name_pattern == Self::ALL_SENTINEL {
            ".*"
        } else {
            &self.name_pattern
        }
    }
}

/// The two error-escalation policies (§7, §GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    FailFast,
    ContinueOnWarning,
}

impl ErrorPolicy {
    pub fn parse(raw: &str) -> anyhow::Result<ErrorPolicy> {
        match raw {
            "fail" => Ok(ErrorPolicy::FailFast),
            "warn" => Ok(ErrorPolicy::ContinueOnWarning),
            other => anyhow::bail!("--on-error must be 'fail' or 'warn', got '{other}'"),
        }
    }
}

/// Concurrent append-only list of `"schema.name"` strings that failed
/// definition fetch or export (§3).
#[derive(Debug, Clone, Default)]
pub struct FailureLedger(Arc<Mutex<Vec<String>>>);

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).push(entry.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How many objects were discovered/written/failed in one `export()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub discovered: usize,
    pub written: usize,
    pub failed_fetch: usize,
    pub failed_write: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NoObjectsFound,
    Completed(ExportSummary),
}

/// Concurrency budgets for the fetch and write stages (§5).
#[derive(Debug, Clone, Copy)]
pub struct Budgets {
    pub c_db: usize,
    pub c_fs: usize,
}

impl Budgets {
    pub const DEFAULT_C_DB: usize = 10;
    pub const DEFAULT_C_FS: usize = 50;

    /// `c_db <= 0` / `c_fs <= 0` fall back to the defaults (§4.3, §5).
    pub fn new(c_db: i64, c_fs: i64) -> Self {
        Self {
            c_db: if c_db <= 0 {
                Self::DEFAULT_C_DB
            } else {
                c_db as usize
            },
            c_fs: if c_fs <= 0 {
                Self::DEFAULT_C_FS
            } else {
                c_fs as usize
            },
        }
    }
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            c_db: Self::DEFAULT_C_DB,
            c_fs: Self::DEFAULT_C_FS,
        }
    }
}
