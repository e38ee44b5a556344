use thiserror::Error;
use uuid::Uuid;

use crate::ingestion::validation::ValidationFailure;
use crate::store::StoreError;

/// Batch-fatal failures: the device config could not be resolved for the
/// caller, so no item is processed and the boundary returns a single error.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("device configuration {0} was not found")]
    DeviceNotFound(Uuid),
    #[error("device configuration {0} does not belong to the requesting user")]
    DeviceNotOwned(Uuid),
    #[error("device configuration {id} is registered for platform `{expected}`, not `{requested}`")]
    PlatformMismatch {
        id: Uuid,
        expected: String,
        requested: String,
    },
    #[error("device configuration {0} is inactive")]
    DeviceInactive(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-item failures. These never abort the batch: the item is recorded in
/// the response's `errors` list and the remaining items are still processed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("unsupported vendor type `{0}`")]
    UnsupportedType(String),
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
