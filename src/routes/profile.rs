use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::models::{BackfillQuery, ErrorResponse, UpdateAddressesRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::routes::search::AppState;
use crate::services::StoreError;

/// Configure address write routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/profile/addresses", web::put().to(update_addresses))
        .route("/admin/geocode-backfill", web::post().to(geocode_backfill));
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "validation_failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Replace the caller's home and/or company address
///
/// PUT /api/v1/profile/addresses
///
/// Request body:
/// ```json
/// {
///   "homeAddress": {"street": "string", "city": "string", "zipcode": "string"},
///   "companyAddress": {"officeName": "string", "street": "string", "city": "string", "zipcode": "string"}
/// }
/// ```
async fn update_addresses(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    req: web::Json<UpdateAddressesRequest>,
) -> Result<HttpResponse, StoreError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for address update: {:?}", errors);
        return Ok(validation_failed(errors));
    }

    let response = state
        .addresses
        .update_addresses(caller.user_id, req.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Geocode stored addresses that have no coordinates yet
///
/// POST /api/v1/admin/geocode-backfill?limit=10
async fn geocode_backfill(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    query: web::Query<BackfillQuery>,
) -> Result<HttpResponse, StoreError> {
    if let Err(errors) = query.validate() {
        return Ok(validation_failed(errors));
    }

    tracing::info!(
        "Coordinate backfill of up to {} addresses requested by user {}",
        query.limit,
        caller.user_id
    );

    let report = state.addresses.backfill_coordinates(query.limit as usize).await?;

    Ok(HttpResponse::Ok().json(report))
}
