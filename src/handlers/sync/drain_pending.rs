use actix_web::{web, HttpResponse};

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::sync::{PendingDrainRequest, PendingDrainResponse};

#[tracing::instrument(
    name = "Drain pending samples",
    skip(request, service, claims),
    fields(
        username = %claims.username,
        device_config_id = %request.device_config_id
    )
)]
pub async fn drain_pending(
    request: web::Json<PendingDrainRequest>,
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
        .drain_pending(user_id, request.device_config_id)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(PendingDrainResponse {
            processed_count: outcome.processed_count,
            errors: outcome.errors,
        }),
        Err(e) => {
            tracing::error!("Pending drain rejected: {}", e);
            config_error_response(e)
        }
    }
}
