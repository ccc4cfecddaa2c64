//! Request wrappers shared by every gossip route: an access log line per
//! request and the wildcard CORS headers the mobile and web clients need.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::Logger;

/// Access log in actix's default format, emitted through `log` and picked up
/// by the tracing subscriber.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Gossip clients run on devices and dev servers with no fixed origin, so
/// every response carries `Access-Control-Allow-Origin: *`. Only
/// `Content-Type` is needed for the JSON bodies. Preflights are answered by
/// the routes themselves with a 204.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_header(header::CONTENT_TYPE)
        .disable_preflight()
        .max_age(3600)
}
