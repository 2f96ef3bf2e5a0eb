//! The Engine Facade (§4.5): the single entry point the CLI calls. Stitches
//! Planner -> Fetcher -> Exporter and applies the batch-level error policy.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::driver::CatalogDriver;
use crate::engine::error::EngineError;
use crate::engine::types::{Budgets, ErrorPolicy, ExportOutcome, ExportSummary, Request};
use crate::engine::{exporter, fetcher, planner};

/// Runs one full extraction: discover, fetch definitions, write files.
///
/// The three phases are separated by a plain sequential `.await` of each
/// phase's aggregate future — that ordering, not an explicit barrier
/// primitive, is what lets `ErrorPolicy::FailFast` reject before any file
/// touches disk (§5).
pub async fn export(
    driver: Arc<dyn CatalogDriver>,
    request: Request,
    output_root: &Path,
    policy: ErrorPolicy,
    budgets: Budgets,
    cancel: CancellationToken,
) -> Result<ExportOutcome, EngineError> {
    let descriptors = planner::discover(driver.as_ref(), &request).await?;

    if descriptors.is_empty() {
        return Ok(ExportOutcome::NoObjectsFound);
    }
    let discovered = descriptors.len();

    let (descriptors, failed) =
        fetcher::fetch_definitions(driver, descriptors, budgets.c_db, cancel.clone()).await;

    if !failed.is_empty() && policy == ErrorPolicy::FailFast {
        return Err(EngineError::PartialDefinitionFailure(failed));
    }

    let remaining: Vec<_> = descriptors
        .into_iter()
        .filter(|d| d.definition.is_some())
        .collect();

    let planned = exporter::plan(output_root, &remaining);
    let planned_count = planned.len();
    let written = exporter::write_all(planned, budgets.c_fs, policy, cancel).await?;

    Ok(ExportOutcome::Completed(ExportSummary {
        discovered,
        written,
        failed_fetch: failed.len(),
        failed_write: planned_count.saturating_sub(written),
    }))
}
