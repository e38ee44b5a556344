use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub mod config;
mod handlers;
pub mod ingestion;
mod middleware;
pub mod models;
mod routes;
pub mod services;
pub mod store;
pub mod telemetry;

use crate::config::jwt::JwtSettings;
use crate::ingestion::IngestionService;
use crate::routes::init_routes;
use crate::store::{DeviceRegistry, SampleStore};

pub fn run(
    listener: TcpListener,
    devices: Arc<dyn DeviceRegistry>,
    store: Arc<dyn SampleStore>,
    jwt_settings: JwtSettings,
) -> Result<Server, std::io::Error> {
    // Wrap using web::Data, which boils down to an Arc smart pointer
    let service_data = web::Data::new(IngestionService::new(devices, store));
    let jwt_settings = web::Data::new(jwt_settings);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:3001")
            .allowed_origin("https://vitalsync.fly.dev")
            .allowed_origin("https://vitalsync-dev.fly.dev")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Get a pointer copy and attach it to the application state
            .app_data(service_data.clone())
            .app_data(jwt_settings.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
