use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Address, SearchMode};

/// Query string of the search endpoint
///
/// `GET /api/v1/search?type=nearbyHome&radiusMiles=3`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    #[serde(rename = "type")]
    pub mode: SearchMode,
    #[validate(range(min = 0.1, max = 100.0))]
    #[serde(alias = "radius_miles", rename = "radiusMiles", default)]
    pub radius_miles: Option<f64>,
}

/// Raw address text submitted by a profile write
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[validate(length(max = 200))]
    #[serde(default)]
    pub office_name: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub city: Option<String>,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl AddressInput {
    /// Convert to an ungeocoded address, trimming text and dropping empty fields
    pub fn into_address(self) -> Address {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Address {
            office_name: clean(self.office_name),
            street: clean(self.street),
            city: clean(self.city),
            zipcode: clean(self.zipcode),
            coordinates: None,
        }
    }
}

/// Request to replace one or both of the caller's addresses
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressesRequest {
    #[validate(nested)]
    #[serde(default)]
    pub home_address: Option<AddressInput>,
    #[validate(nested)]
    #[serde(default)]
    pub company_address: Option<AddressInput>,
}

/// Query string of the coordinate backfill endpoint
///
/// Lookups run one per second inside the request, so a batch stays small.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackfillQuery {
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_backfill_limit")]
    pub limit: u32,
}

fn default_backfill_limit() -> u32 {
    10
}
