use serde::{Deserialize, Serialize};
use crate::models::domain::{Address, MatchReasons, RankedMatch, UserId};

/// Company address as shown to other users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAddressView {
    pub office_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
}

impl From<&Address> for CompanyAddressView {
    fn from(address: &Address) -> Self {
        Self {
            office_name: address.office_name.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            zipcode: address.zipcode.clone(),
        }
    }
}

/// Home address as shown to other users. The street is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeAddressView {
    pub city: Option<String>,
    pub zipcode: Option<String>,
}

impl From<&Address> for HomeAddressView {
    fn from(address: &Address) -> Self {
        Self {
            city: address.city.clone(),
            zipcode: address.zipcode.clone(),
        }
    }
}

/// One entry of the search response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub willing_to_take: Vec<i32>,
    pub has_drivers_license: Option<bool>,
    pub profile_path: Option<String>,
    pub company_address: Option<CompanyAddressView>,
    pub home_address: Option<HomeAddressView>,
    pub match_score: MatchReasons,
}

impl From<RankedMatch> for MatchSummary {
    fn from(ranked: RankedMatch) -> Self {
        let RankedMatch { user, reasons } = ranked;
        Self {
            company_address: user.company_address.as_ref().map(CompanyAddressView::from),
            home_address: user.home_address.as_ref().map(HomeAddressView::from),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            willing_to_take: user.willing_to_take,
            has_drivers_license: user.has_drivers_license,
            profile_path: user.profile_path,
            match_score: reasons,
        }
    }
}

/// Addresses stored for the caller after a profile write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressesResponse {
    pub home_address: Option<Address>,
    pub company_address: Option<Address>,
}

/// Coordinate backfill outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub examined: usize,
    pub geocoded: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub spatial_search: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
