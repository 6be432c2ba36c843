use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use crate::config::GeocoderSettings;
use crate::models::{Address, Coordinates};
use crate::services::rate_limit::RateLimiter;

/// Errors that can occur when calling the geocoding API
///
/// Never leaves this module: `Geocoder::geocode` logs them and reports an
/// unknown location instead.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    ApiError(reqwest::StatusCode),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Address text to resolve
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AddressQuery {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
}

impl AddressQuery {
    pub fn from_address(address: &Address) -> Self {
        Self {
            street: address.street.clone(),
            city: address.city.clone(),
            zipcode: address.zipcode.clone(),
        }
    }

    /// Comma-joined free-text query, or `None` when nothing locates the address
    pub fn to_query_text(&self, country: &str) -> Option<String> {
        let located: Vec<&str> = [&self.street, &self.city, &self.zipcode]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim).filter(|p| !p.is_empty()))
            .collect();

        if located.is_empty() {
            return None;
        }

        let mut parts = located;
        if !country.trim().is_empty() {
            parts.push(country.trim());
        }
        Some(parts.join(", "))
    }
}

/// Resolves address text to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` means unknown location; callers store the address without coordinates
    async fn geocode(&self, query: &AddressQuery) -> Option<Coordinates>;
}

/// Geocode several addresses one after another
///
/// Sequential on purpose so the geocoder's rate limit applies between items.
pub async fn geocode_batch(
    geocoder: &dyn Geocoder,
    queries: &[AddressQuery],
) -> Vec<Option<Coordinates>> {
    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        results.push(geocoder.geocode(query).await);
    }
    results
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim client
///
/// Handles:
/// - the one request per second limit, through a shared `RateLimiter`
/// - caching of successful lookups keyed by query text
/// - converting every failure into an unknown location
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    country: String,
    client: Client,
    limiter: Arc<RateLimiter>,
    cache: moka::future::Cache<String, Coordinates>,
}

impl NominatimGeocoder {
    /// Create a new Nominatim client
    pub fn new(settings: &GeocoderSettings, limiter: Arc<RateLimiter>) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let cache = moka::future::CacheBuilder::new(settings.cache_size)
            .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
            .build();

        Ok(Self {
            base_url: settings.base_url.clone(),
            user_agent: settings.user_agent.clone(),
            country: settings.country.clone(),
            client,
            limiter,
            cache,
        })
    }

    async fn lookup(&self, text: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1&addressdetails=0",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(text)
        );

        self.limiter.acquire().await;

        tracing::debug!("Geocoding request: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::ApiError(response.status()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        let Some(place) = places.first() else {
            return Ok(None);
        };

        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::InvalidResponse(format!("lat '{}': {}", place.lat, e)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::InvalidResponse(format!("lon '{}': {}", place.lon, e)))?;

        Ok(Some(Coordinates::new(latitude, longitude)))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &AddressQuery) -> Option<Coordinates> {
        let text = query.to_query_text(&self.country)?;

        if let Some(hit) = self.cache.get(&text).await {
            tracing::trace!("Geocode cache hit: {}", text);
            return Some(hit);
        }

        match self.lookup(&text).await {
            Ok(Some(coordinates)) => {
                tracing::info!(
                    "Geocoded '{}' -> ({}, {})",
                    text,
                    coordinates.latitude,
                    coordinates.longitude
                );
                self.cache.insert(text, coordinates).await;
                Some(coordinates)
            }
            Ok(None) => {
                tracing::warn!("No results found for address: {}", text);
                None
            }
            Err(e) => {
                tracing::error!("Error geocoding address '{}': {}", text, e);
                None
            }
        }
    }
}
