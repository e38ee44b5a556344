use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::sync::config_error_response;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::sample::CanonicalType;

#[derive(Debug, Deserialize)]
pub struct LatestValuesQuery {
    /// Comma-separated canonical type names; all types when absent.
    #[serde(default)]
    pub types: Option<String>,
}

#[tracing::instrument(
    name = "Get latest values",
    skip(service, claims, query),
    fields(username = %claims.username, device_config_id = %device_config_id)
)]
pub async fn latest_values(
    device_config_id: web::Path<Uuid>,
    query: web::Query<LatestValuesQuery>,
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

    let types = match &query.types {
        None => CanonicalType::ALL.to_vec(),
        Some(raw) => {
            let parsed: Result<Vec<CanonicalType>, _> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect();
            match parsed {
                Ok(types) => types,
                Err(e) => {
                    return HttpResponse::BadRequest()
                        .json(ApiResponse::<()>::error(e.to_string()));
                }
            }
        }
    };

    match service
        .latest_values(user_id, *device_config_id, &types)
        .await
    {
        Ok(latest) => HttpResponse::Ok().json(latest),
        Err(e) => {
            tracing::error!("Failed to get latest values: {}", e);
            config_error_response(e)
        }
    }
}
