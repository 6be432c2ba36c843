use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use crate::models::{AddressKind, ErrorResponse};
use crate::services::StoreError;

/// Why a searcher's address cannot drive the requested search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionFailure {
    AddressNotSet(AddressKind),
    AddressNotGeocoded(AddressKind),
}

/// Errors returned by a match search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", precondition_message(.0))]
    Precondition(PreconditionFailure),

    #[error("Location search is temporarily unavailable, please try again later")]
    ServiceUnavailable(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

fn precondition_message(failure: &PreconditionFailure) -> String {
    match failure {
        PreconditionFailure::AddressNotSet(kind) => {
            format!("Please complete your {} address in your profile first", kind)
        }
        PreconditionFailure::AddressNotGeocoded(kind) => format!(
            "Your {} address could not be located yet; check the street, city and zip code in your profile",
            kind
        ),
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SpatialUnavailable(detail) => SearchError::ServiceUnavailable(detail),
            StoreError::NotFound(detail) => SearchError::NotFound(detail),
            other => SearchError::Storage(other),
        }
    }
}

impl SearchError {
    fn error_code(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "validation_failed",
            SearchError::Precondition(PreconditionFailure::AddressNotSet(_)) => "address_not_set",
            SearchError::Precondition(PreconditionFailure::AddressNotGeocoded(_)) => {
                "address_not_geocoded"
            }
            SearchError::ServiceUnavailable(_) => "service_unavailable",
            SearchError::NotFound(_) => "not_found",
            SearchError::Storage(_) => "storage_error",
        }
    }
}

impl ResponseError for SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchError::Validation(_) | SearchError::Precondition(_) => StatusCode::BAD_REQUEST,
            SearchError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SearchError::Storage(err) => {
                tracing::error!("Storage failure during search: {}", err);
                "An internal error occurred".to_string()
            }
            SearchError::ServiceUnavailable(detail) => {
                tracing::warn!("Spatial search unavailable: {}", detail);
                self.to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.error_code().to_string(),
            message,
            status_code: self.status_code().as_u16(),
        })
    }
}

/// Storage errors surfaced by the profile endpoints
impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::SpatialUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message) = match self {
            StoreError::NotFound(detail) => ("not_found", format!("Not found: {}", detail)),
            StoreError::SpatialUnavailable(_) => (
                "service_unavailable",
                "Location search is temporarily unavailable, please try again later".to_string(),
            ),
            other => {
                tracing::error!("Storage failure: {}", other);
                ("storage_error", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            message,
            status_code: self.status_code().as_u16(),
        })
    }
}
