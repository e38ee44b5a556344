use actix_web::{web, HttpResponse};

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::sync::{SampleBatchRequest, SampleBatchResponse};

#[tracing::instrument(
    name = "Upload sample batch",
    skip(request, service, claims),
    fields(
        username = %claims.username,
        device_config_id = %request.device_config_id,
        batch_size = request.samples.len()
    )
)]
pub async fn upload_samples(
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
        .ingest_batch(
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
            tracing::error!("Sample batch rejected: {}", e);
            config_error_response(e)
        }
    }
}
