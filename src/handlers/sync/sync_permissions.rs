use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

/// Grant/deny state inferred from recent write activity. There is no
/// platform permission API behind this; callers must treat it as a
/// heuristic, not an OS-level grant.
#[tracing::instrument(
    name = "Get inferred permissions",
    skip(service, claims),
    fields(username = %claims.username, device_config_id = %device_config_id)
)]
pub async fn sync_permissions(
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

    match service
        .inferred_permissions(user_id, *device_config_id)
        .await
    {
        Ok(permissions) => HttpResponse::Ok().json(permissions),
        Err(e) => {
            tracing::error!("Failed to infer permissions: {}", e);
            config_error_response(e)
        }
    }
}
