pub mod drain_pending;
pub mod latest_values;
pub mod stage_samples;
pub mod supported_types;
pub mod sync_permissions;
pub mod sync_status;
pub mod upload_samples;

use actix_web::HttpResponse;

use crate::ingestion::error::IngestionError;
use crate::models::common::ApiResponse;

/// Map a batch-fatal config error onto the boundary status code. Per-item
/// errors never reach this: they travel inside the structured response.
pub(crate) fn config_error_response(error: IngestionError) -> HttpResponse {
    let message = error.to_string();
    match &error {
        IngestionError::DeviceNotFound(_) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(message))
        }
        IngestionError::DeviceNotOwned(_) => {
            HttpResponse::Forbidden().json(ApiResponse::<()>::error(message))
        }
        IngestionError::PlatformMismatch { .. } | IngestionError::DeviceInactive(_) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
        }
        IngestionError::Store(e) => {
            tracing::error!("store failure while resolving device config: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to access sample store"))
        }
    }
}
