//! `pgmeta`: extracts a PostgreSQL database's schema-level catalog to a
//! tree of reproducible `CREATE …` statements.

pub mod cli;
pub mod engine;
pub mod logging;
pub mod profiles;
