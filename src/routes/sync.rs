use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::handlers::sync::drain_pending::drain_pending;
use crate::handlers::sync::latest_values::{latest_values, LatestValuesQuery};
use crate::handlers::sync::stage_samples::stage_samples;
use crate::handlers::sync::supported_types::supported_types;
use crate::handlers::sync::sync_permissions::sync_permissions;
use crate::handlers::sync::sync_status::sync_status;
use crate::handlers::sync::upload_samples::upload_samples;
use crate::ingestion::IngestionService;
use crate::middleware::auth::Claims;
use crate::models::sync::{PendingDrainRequest, SampleBatchRequest};

#[post("/upload")]
pub async fn upload(
    request: web::Json<SampleBatchRequest>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    upload_samples(request, service, claims).await
}

#[post("/stage")]
pub async fn stage(
    request: web::Json<SampleBatchRequest>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    stage_samples(request, service, claims).await
}

#[post("/drain")]
pub async fn drain(
    request: web::Json<PendingDrainRequest>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    drain_pending(request, service, claims).await
}

#[get("/status/{device_config_id}")]
pub async fn status(
    device_config_id: web::Path<Uuid>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    sync_status(device_config_id, service, claims).await
}

#[get("/permissions/{device_config_id}")]
pub async fn permissions(
    device_config_id: web::Path<Uuid>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    sync_permissions(device_config_id, service, claims).await
}

#[get("/latest/{device_config_id}")]
pub async fn latest(
    device_config_id: web::Path<Uuid>,
    query: web::Query<LatestValuesQuery>,
    service: web::Data<IngestionService>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    latest_values(device_config_id, query, service, claims).await
}

#[get("/supported_types")]
pub async fn supported() -> HttpResponse {
    supported_types().await
}
