use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

#[tracing::instrument(
    name = "Get sync status",
    skip(service, claims),
    fields(username = %claims.username, device_config_id = %device_config_id)
)]
pub async fn sync_status(
    device_config_id: web::Path<Uuid>,
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

    match service.sync_status(user_id, *device_config_id).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => {
            tracing::error!("Failed to get sync status: {}", e);
            config_error_response(e)
        }
    }
}
