// Route exports
pub mod auth;
pub mod profile;
pub mod search;

pub use auth::{AuthError, AuthenticatedUser, Claims, JwtValidator};
pub use search::AppState;

use actix_web::{error, web, HttpRequest, HttpResponse};
use crate::models::ErrorResponse;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(search::configure)
            .configure(profile::configure),
    );
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let message = format!("Invalid JSON: {}", err);
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ErrorResponse {
            error: "invalid_json".to_string(),
            message,
            status_code: 400,
        }),
    )
    .into()
}

/// Handle query string errors, including unknown search modes
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    let message = format!("Invalid query: {}", err);
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ErrorResponse {
            error: "invalid_query".to_string(),
            message,
            status_code: 400,
        }),
    )
    .into()
}
