use actix_web::{dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;
use crate::models::{ErrorResponse, UserId};

/// Claims carried by the bearer tokens the auth service issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header(("WWW-Authenticate", "Bearer"))
            .json(ErrorResponse {
                error: "unauthorized".to_string(),
                message: self.to_string(),
                status_code: 401,
            })
    }
}

/// HS256 token validation; issuing tokens is someone else's job
#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// The caller identified by the `Authorization: Bearer` header
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let header = req.headers().get(actix_web::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;

    let validator = req
        .app_data::<web::Data<JwtValidator>>()
        .ok_or_else(|| AuthError::InvalidToken("token validation is not configured".to_string()))?;

    let claims = validator.validate(token)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req);
        if let Err(e) = &result {
            tracing::info!("Rejected request to {}: {}", req.path(), e);
        }
        ready(result)
    }
}
