use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::Matcher;
use crate::error::SearchError;
use crate::models::{HealthResponse, SearchQuery};
use crate::routes::auth::AuthenticatedUser;
use crate::services::{AddressService, AddressStore};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AddressStore>,
    pub addresses: Arc<AddressService>,
    pub matcher: Matcher,
}

/// Configure search and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/search", web::get().to(search));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        spatial_search: state.store.spatial_search_available(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find commute matches for the caller
///
/// GET /api/v1/search?type=office|street|city|all|nearbyHome|nearbyWork&radiusMiles=5
///
/// Responds with at most six matches, best first.
async fn search(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, SearchError> {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return Err(SearchError::Validation(errors.to_string()));
    }

    tracing::info!(
        "Searching matches for user {} (mode: {}, radius: {:?})",
        caller.user_id,
        query.mode,
        query.radius_miles
    );

    let result = state
        .matcher
        .search(state.store.as_ref(), caller.user_id, query.mode, query.radius_miles)
        .await?;

    tracing::info!(
        "Returning {} matches for user {} (from {} candidates)",
        result.matches.len(),
        caller.user_id,
        result.total_candidates
    );

    Ok(HttpResponse::Ok().json(result.matches))
}
