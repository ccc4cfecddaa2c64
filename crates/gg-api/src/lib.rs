//! # gg-api
//!
//! The HTTP surface for GeoGossip: three JSON endpoints over the gossip
//! service, each answering its own CORS preflight.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::http::Method;
use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;

/// Configures the gossip routes.
///
/// # Developer Note
/// Every resource answers `OPTIONS` itself with a 204 and anything other
/// than its own method with a JSON 405, so the routes behave the same
/// behind any proxy that forwards preflights.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .app_data(handlers::query_config())
        .service(
            web::resource("/submitGossip")
                .route(web::post().to(handlers::submit_gossip))
                .route(web::method(Method::OPTIONS).to(|| async { handlers::preflight("POST, OPTIONS") }))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/listGossips")
                .route(web::get().to(handlers::list_gossips))
                .route(web::method(Method::OPTIONS).to(|| async { handlers::preflight("GET, OPTIONS") }))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .service(
            web::resource("/deleteGossip")
                .route(web::delete().to(handlers::delete_gossip))
                .route(web::method(Method::OPTIONS).to(|| async { handlers::preflight("DELETE, OPTIONS") }))
                .default_service(web::to(handlers::method_not_allowed)),
        )
        .route("/healthz", web::get().to(handlers::health));
}
