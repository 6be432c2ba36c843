use crate::core::{distance::meters_to_miles, filters::same_field};
use crate::models::{Candidate, MatchReasons, ModeWeights, SearchMode, User};

/// Calculate a searcher-relative priority score for one candidate
///
/// Contributions are additive and independent:
/// ```text
///   home city     1000   every mode
///   home zipcode   500   every mode
///   home street    300   office / street / city
///   office         100   office          2000  all, nearby*
///   work street     75   office / street  150  all, nearby*
///   work city       50   office / street / city
///                  100   all, nearby*
///   proximity      max(0, 200 - 20 * miles)  radius results only
/// ```
/// A condition only counts when both users have the field set. Scores are
/// not comparable across searchers or modes.
pub fn calculate_match_score(
    searcher: &User,
    candidate: &Candidate,
    mode: SearchMode,
) -> (f64, MatchReasons) {
    let weights = ModeWeights::for_mode(mode);
    let other = &candidate.user;
    let mut score = 0.0;
    let mut reasons = MatchReasons::default();

    // Home affinity
    if let (Some(mine), Some(theirs)) = (&searcher.home_address, &other.home_address) {
        if same_field(&mine.city, &theirs.city) {
            score += weights.home_city;
            reasons.same_home_city = true;
        }

        if same_field(&mine.zipcode, &theirs.zipcode) {
            score += weights.home_zipcode;
            reasons.same_home_zipcode = true;
        }

        if weights.home_street > 0.0 && same_field(&mine.street, &theirs.street) {
            score += weights.home_street;
            reasons.same_home_street = true;
        }
    }

    // Work affinity
    if let (Some(mine), Some(theirs)) = (&searcher.company_address, &other.company_address) {
        if weights.office > 0.0 && same_field(&mine.office_name, &theirs.office_name) {
            score += weights.office;
            reasons.same_office = true;
        }

        if weights.work_street > 0.0 && same_field(&mine.street, &theirs.street) {
            score += weights.work_street;
            reasons.same_work_street = true;
        }

        if weights.work_city > 0.0 && same_field(&mine.city, &theirs.city) {
            score += weights.work_city;
            reasons.same_work_city = true;
        }
    }

    // Proximity, only for candidates that came out of a radius query
    if let Some(meters) = candidate.distance_meters {
        let miles = meters_to_miles(meters);
        score += proximity_bonus(miles, &weights);

        let rounded = round_miles(miles);
        if mode == SearchMode::NearbyHome {
            reasons.home_distance_miles = Some(rounded);
        } else {
            reasons.work_distance_miles = Some(rounded);
        }
    }

    (score, reasons)
}

/// Linear bonus that reaches zero at 10 miles with the default weights
#[inline]
pub fn proximity_bonus(miles: f64, weights: &ModeWeights) -> f64 {
    (weights.proximity_max - weights.proximity_per_mile * miles).max(0.0)
}

#[inline]
fn round_miles(miles: f64) -> f64 {
    (miles * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Coordinates};

    fn user(id: i64, home: Option<Address>, company: Option<Address>) -> User {
        User {
            id,
            first_name: format!("User{}", id),
            last_name: "Test".into(),
            email: format!("user{}@example.com", id),
            phone: None,
            role: "driver".into(),
            willing_to_take: vec![],
            has_drivers_license: Some(true),
            profile_path: None,
            home_address: home,
            company_address: company,
            created_at: None,
        }
    }

    fn home(street: Option<&str>, city: &str, zipcode: &str) -> Address {
        Address {
            street: street.map(String::from),
            city: Some(city.into()),
            zipcode: Some(zipcode.into()),
            ..Default::default()
        }
    }

    fn office(name: &str, street: &str, city: &str) -> Address {
        Address {
            office_name: Some(name.into()),
            street: Some(street.into()),
            city: Some(city.into()),
            zipcode: Some("78701".into()),
            coordinates: None,
        }
    }

    fn candidate(user: User) -> Candidate {
        Candidate {
            user,
            distance_meters: None,
        }
    }

    #[test]
    fn test_same_home_city_only() {
        let searcher = user(1, Some(home(None, "Austin", "78701")), None);
        let other = candidate(user(2, Some(home(None, "austin", "78745")), None));

        let (score, reasons) = calculate_match_score(&searcher, &other, SearchMode::City);

        assert_eq!(score, 1000.0);
        assert_eq!(
            reasons,
            MatchReasons {
                same_home_city: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_home_street_excluded_from_all_mode() {
        let searcher = user(1, Some(home(Some("1 Elm St"), "Austin", "78701")), None);
        let other = candidate(user(2, Some(home(Some("1 elm st"), "Austin", "78701")), None));

        let (exact, reasons) = calculate_match_score(&searcher, &other, SearchMode::Street);
        assert_eq!(exact, 1800.0);
        assert!(reasons.same_home_street);

        let (all, reasons) = calculate_match_score(&searcher, &other, SearchMode::All);
        assert_eq!(all, 1500.0);
        assert!(!reasons.same_home_street);
    }

    #[test]
    fn test_office_weights_differ_by_mode() {
        let searcher = user(1, None, Some(office("Acme Corp", "500 Congress Ave", "Austin")));
        let other = candidate(user(2, None, Some(office("acme corp", "1 Other Rd", "Round Rock"))));

        let (office_score, reasons) = calculate_match_score(&searcher, &other, SearchMode::Office);
        assert_eq!(office_score, 100.0);
        assert!(reasons.same_office);

        let (all_score, reasons) = calculate_match_score(&searcher, &other, SearchMode::All);
        assert_eq!(all_score, 2000.0);
        assert!(reasons.same_office);

        let (city_score, reasons) = calculate_match_score(&searcher, &other, SearchMode::City);
        assert_eq!(city_score, 0.0);
        assert!(!reasons.same_office);
    }

    #[test]
    fn test_work_street_and_city_weights() {
        let searcher = user(1, None, Some(office("A", "500 Congress Ave", "Austin")));
        let other = candidate(user(2, None, Some(office("B", "500 congress ave", "AUSTIN"))));

        let (office_score, _) = calculate_match_score(&searcher, &other, SearchMode::Office);
        assert_eq!(office_score, 125.0);

        let (street_score, _) = calculate_match_score(&searcher, &other, SearchMode::Street);
        assert_eq!(street_score, 125.0);

        let (city_score, reasons) = calculate_match_score(&searcher, &other, SearchMode::City);
        assert_eq!(city_score, 50.0);
        assert!(!reasons.same_work_street);
        assert!(reasons.same_work_city);

        let (all_score, _) = calculate_match_score(&searcher, &other, SearchMode::All);
        assert_eq!(all_score, 250.0);
    }

    #[test]
    fn test_proximity_bonus() {
        let weights = ModeWeights::for_mode(SearchMode::All);
        assert!((proximity_bonus(1.0, &weights) - 180.0).abs() < 1e-9);
        assert!((proximity_bonus(4.0, &weights) - 120.0).abs() < 1e-9);
        assert_eq!(proximity_bonus(12.0, &weights), 0.0);
    }

    #[test]
    fn test_radius_distance_lands_in_reasons() {
        let mut company = office("A", "1 St", "Austin");
        company.coordinates = Some(Coordinates::new(30.0, -97.0));
        let searcher = user(1, None, Some(company));
        let other = Candidate {
            user: user(2, None, None),
            distance_meters: Some(2.0 * 1609.344),
        };

        let (score, reasons) = calculate_match_score(&searcher, &other, SearchMode::NearbyWork);
        assert!((score - 160.0).abs() < 1e-9);
        assert_eq!(reasons.work_distance_miles, Some(2.0));
        assert_eq!(reasons.home_distance_miles, None);

        let (_, reasons) = calculate_match_score(&searcher, &other, SearchMode::NearbyHome);
        assert_eq!(reasons.home_distance_miles, Some(2.0));
    }

    #[test]
    fn test_unrelated_fields_do_not_change_score() {
        let searcher = user(1, Some(home(None, "Austin", "78701")), None);
        let plain = candidate(user(2, Some(home(None, "Austin", "78745")), None));

        let mut decorated_user = plain.user.clone();
        decorated_user.phone = Some("555-0100".into());
        decorated_user.profile_path = Some("profiles/2.png".into());
        decorated_user.company_address = Some(office("Elsewhere", "9 Far Rd", "Dallas"));
        let decorated = candidate(decorated_user);

        let (a, _) = calculate_match_score(&searcher, &plain, SearchMode::City);
        let (b, _) = calculate_match_score(&searcher, &decorated, SearchMode::City);
        assert_eq!(a, b);
    }

    #[test]
    fn test_candidate_without_addresses_scores_zero() {
        let searcher = user(1, Some(home(None, "Austin", "78701")), Some(office("A", "1 St", "Austin")));
        let other = candidate(user(2, None, None));

        let (score, reasons) = calculate_match_score(&searcher, &other, SearchMode::All);
        assert_eq!(score, 0.0);
        assert_eq!(reasons, MatchReasons::default());
    }
}
