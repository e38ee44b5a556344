use actix_web::HttpResponse;

use crate::ingestion::catalog::SUPPORTED_TYPES;

/// Static catalog of selectable data types; purely descriptive.
pub async fn supported_types() -> HttpResponse {
    HttpResponse::Ok().json(SUPPORTED_TYPES)
}
