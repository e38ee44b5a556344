use actix_web::{web, HttpResponse};

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::sync::{SampleBatchRequest, SampleBatchResponse};

/// Buffered entry point for data arriving outside the interactive
/// request/response cycle (bulk historical backfill, platform push events).
/// Items are staged as pending samples and applied by a later drain.
#[tracing::instrument(
    name = "Stage sample batch",
    skip(request, service, claims),
    fields(
        username = %claims.username,
        device_config_id = %request.device_config_id,
        batch_size = request.samples.len()
    )
)]
pub async fn stage_samples(
    request: web::Json<SampleBatchRequest>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = match claims.user_id() {
        Some(id) => id,
        None => {
            tracing::error!("Failed to parse user ID from claims");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Invalid user ID"));
        }
    };

    match service
        .stage_batch(
            user_id,
            request.device_config_id,
            request.platform.as_deref(),
            &request.samples,
        )
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(SampleBatchResponse {
            success: outcome.errors.is_empty(),
            processed_count: outcome.processed_count,
            errors: outcome.errors,
        }),
        Err(e) => {
            tracing::error!("Sample staging rejected: {}", e);
            config_error_response(e)
        }
    }
}
