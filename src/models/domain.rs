use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a user row
pub type UserId = i64;

/// A geocoded point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Which of a user's two addresses a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Home,
    Company,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Home => write!(f, "home"),
            AddressKind::Company => write!(f, "company"),
        }
    }
}

/// Home or company address
///
/// `office_name` is only meaningful for company addresses. Coordinates are
/// derived from the text fields at write time and are either fully present
/// or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub office_name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Address {
    /// True when the fields a geocoder sees (street, city, zipcode) are identical
    ///
    /// The office name is a label and never changes the coordinates.
    pub fn same_location_text(&self, other: &Address) -> bool {
        self.street == other.street
            && self.city == other.city
            && self.zipcode == other.zipcode
    }

    /// True when no locating field is set (office name does not locate anything)
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.zipcode]
            .iter()
            .all(|field| field.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// User with both optional addresses loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: String,
    #[serde(default)]
    pub willing_to_take: Vec<i32>,
    #[serde(default)]
    pub has_drivers_license: Option<bool>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub home_address: Option<Address>,
    #[serde(default)]
    pub company_address: Option<Address>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    pub fn address(&self, kind: AddressKind) -> Option<&Address> {
        match kind {
            AddressKind::Home => self.home_address.as_ref(),
            AddressKind::Company => self.company_address.as_ref(),
        }
    }
}

/// Strategy used to build the candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    Office,
    Street,
    City,
    All,
    NearbyHome,
    NearbyWork,
}

impl SearchMode {
    /// Address the searcher must have before any search in this mode
    pub fn required_address(self) -> AddressKind {
        match self {
            SearchMode::NearbyHome => AddressKind::Home,
            _ => AddressKind::Company,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Office => "office",
            SearchMode::Street => "street",
            SearchMode::City => "city",
            SearchMode::All => "all",
            SearchMode::NearbyHome => "nearbyHome",
            SearchMode::NearbyWork => "nearbyWork",
        };
        f.write_str(name)
    }
}

/// Exact-match filter over company address fields
///
/// All comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressPredicate {
    OfficeName(String),
    /// Street must match; a `None` city only matches candidates without a city
    StreetAndCity { street: String, city: Option<String> },
    City(String),
    HasCompanyAddress,
}

/// A user pulled into the pool, with the radius query distance if any
#[derive(Debug, Clone)]
pub struct Candidate {
    pub user: User,
    pub distance_meters: Option<f64>,
}

/// Why a candidate was scored the way it was
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReasons {
    pub same_home_city: bool,
    pub same_home_street: bool,
    pub same_home_zipcode: bool,
    pub same_office: bool,
    pub same_work_street: bool,
    pub same_work_city: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub work_distance_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub home_distance_miles: Option<f64>,
}

/// Candidate with its searcher-relative score
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub user: User,
    pub score: f64,
    pub reasons: MatchReasons,
}

/// Ranked result with the internal score removed
#[derive(Debug, Clone)]
pub struct RankedMatch {
    pub user: User,
    pub reasons: MatchReasons,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Point values for one search mode
///
/// The exact-match and geospatial paths weigh the same conditions
/// differently (same office is 100 in `office` mode but 2000 in `all`).
/// Both tables are kept as-is; a zero weight means the condition does not
/// apply in that mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeWeights {
    pub home_city: f64,
    pub home_zipcode: f64,
    pub home_street: f64,
    pub office: f64,
    pub work_street: f64,
    pub work_city: f64,
    pub proximity_max: f64,
    pub proximity_per_mile: f64,
}

impl ModeWeights {
    pub fn for_mode(mode: SearchMode) -> Self {
        let base = Self {
            home_city: 1000.0,
            home_zipcode: 500.0,
            home_street: 0.0,
            office: 0.0,
            work_street: 0.0,
            work_city: 0.0,
            proximity_max: 200.0,
            proximity_per_mile: 20.0,
        };

        match mode {
            SearchMode::Office => Self {
                home_street: 300.0,
                office: 100.0,
                work_street: 75.0,
                work_city: 50.0,
                ..base
            },
            SearchMode::Street => Self {
                home_street: 300.0,
                work_street: 75.0,
                work_city: 50.0,
                ..base
            },
            SearchMode::City => Self {
                home_street: 300.0,
                work_city: 50.0,
                ..base
            },
            SearchMode::All | SearchMode::NearbyHome | SearchMode::NearbyWork => Self {
                office: 2000.0,
                work_street: 150.0,
                work_city: 100.0,
                ..base
            },
        }
    }
}

/// Tunables for candidate selection and ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    pub result_limit: usize,
    pub raw_candidate_cap: usize,
    pub all_radius_meters: f64,
    pub default_nearby_radius_miles: f64,
    pub max_nearby_radius_miles: f64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            result_limit: 6,
            raw_candidate_cap: 20,
            all_radius_meters: 16_093.44,
            default_nearby_radius_miles: 5.0,
            max_nearby_radius_miles: 50.0,
        }
    }
}
