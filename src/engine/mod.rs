//! The Extraction Engine: Driver -> Planner -> Fetcher -> Exporter,
//! stitched by the Facade. This is the core of the crate; everything under
//! `cli`/`profiles`/`logging` is a thin shell around a single call to
//! [`facade::export`].

pub mod driver;
pub mod error;
pub mod exporter;
pub mod facade;
pub mod fetcher;
pub mod planner;
pub mod quoting;
pub mod types;

pub use driver::{CatalogDriver, PgCatalogDriver};
pub use error::EngineError;
pub use types::{
    Budgets, ErrorPolicy, ExportOutcome, ExportSummary, ObjectDescriptor, ObjectType, Request,
};
