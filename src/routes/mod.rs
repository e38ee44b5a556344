use actix_web::web;

pub mod backend_health;
pub mod sync;

use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    // Sync routes (require authentication)
    cfg.service(
        web::scope("/sync")
            .wrap(AuthMiddleware)
            .service(sync::upload)
            .service(sync::stage)
            .service(sync::drain)
            .service(sync::status)
            .service(sync::permissions)
            .service(sync::latest)
            .service(sync::supported),
    );
}
