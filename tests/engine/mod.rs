// Integration tests for the extraction engine against a real PostgreSQL
// instance. Requires DATABASE_URL; see tests/helpers/harness.rs.

pub mod constraints;
pub mod export_flow;
pub mod publications;
pub mod schemas;
pub mod tables;
pub mod views;
