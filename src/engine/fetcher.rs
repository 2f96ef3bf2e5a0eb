//! The Definition Fetcher (§4.3): populates `definition` for every
//! descriptor that doesn't already carry one, concurrently, under a
//! semaphore-bounded budget.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::engine::driver::CatalogDriver;
use crate::engine::types::{FailureLedger, ObjectDescriptor};

/// Runs DDL lookups for every descriptor missing a `definition`, returning
/// results in input order alongside a snapshot of the failures recorded.
pub async fn fetch_definitions(
    driver: Arc<dyn CatalogDriver>,
    descriptors: Vec<ObjectDescriptor>,
    c_db: usize,
    cancel: CancellationToken,
) -> (Vec<ObjectDescriptor>, Vec<String>) {
    let semaphore = Arc::new(Semaphore::new(c_db.max(1)));
    let ledger = FailureLedger::new();
    let mut handles = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        if descriptor.definition.is_some() {
            handles.push(tokio::spawn(async move { descriptor }));
            continue;
        }

        let driver = Arc::clone(&driver);
        let semaphore = Arc::clone(&semaphore);
        let ledger = ledger.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            if cancel.is_cancelled() {
                return descriptor;
            }

            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return descriptor,
            };

            match driver.fetch_definition(&descriptor).await {
                Ok(definition) => {
                    let mut populated = descriptor;
                    populated.definition = Some(definition);
                    populated
                }
                Err(err) => {
                    let qualified = descriptor.qualified_name();
                    tracing::warn!(object = %qualified, error = %err, "failed to fetch definition");
                    ledger.record(qualified);
                    descriptor
                }
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(descriptor) => results.push(descriptor),
            Err(join_err) => {
                tracing::warn!(error = %join_err, "fetch task panicked");
            }
        }
    }

    (results, ledger.snapshot())
}
