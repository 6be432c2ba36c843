// Unit tests for the scoring pipeline

use carpool_match::core::{
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, meters_to_miles},
    filters::same_field,
    ranking::rank,
    scoring::calculate_match_score,
    Matcher,
};
use carpool_match::models::{
    Address, Candidate, MatchReasons, ModeWeights, ScoredCandidate, SearchMode, User,
};
use carpool_match::services::InMemoryStore;

fn create_user(id: i64, home_city: Option<&str>, home_zip: Option<&str>) -> User {
    User {
        id,
        first_name: format!("User{}", id),
        last_name: "Test".to_string(),
        email: format!("user{}@example.com", id),
        phone: None,
        role: "passenger".to_string(),
        willing_to_take: vec![],
        has_drivers_license: None,
        profile_path: None,
        home_address: Some(Address {
            street: Some("12 Elm St".to_string()),
            city: home_city.map(String::from),
            zipcode: home_zip.map(String::from),
            ..Default::default()
        }),
        company_address: Some(Address {
            office_name: Some("Acme Corp".to_string()),
            street: Some("500 Congress Ave".to_string()),
            city: Some("Austin".to_string()),
            ..Default::default()
        }),
        created_at: None,
    }
}

fn candidate(user: User, distance_meters: Option<f64>) -> Candidate {
    Candidate {
        user,
        distance_meters,
    }
}

fn scored(id: i64, score: f64) -> ScoredCandidate {
    ScoredCandidate {
        user: create_user(id, None, None),
        score,
        reasons: MatchReasons::default(),
    }
}

#[test]
fn test_haversine_distance_zero() {
    let d = haversine_distance(30.2672, -97.7431, 30.2672, -97.7431);
    assert!(d < 1e-6);
}

#[test]
fn test_haversine_distance_austin_to_round_rock() {
    // Downtown Austin to downtown Round Rock, roughly 17 miles
    let d = haversine_distance(30.2672, -97.7431, 30.5083, -97.6789);
    let miles = meters_to_miles(d);
    assert!(miles > 16.0 && miles < 18.5, "Expected ~17 miles, got {}", miles);
}

#[test]
fn test_bounding_box_contains_radius() {
    let bbox = calculate_bounding_box(30.2672, -97.7431, 16_093.44);

    assert!(is_within_bounding_box(30.2672, -97.7431, &bbox));
    assert!(is_within_bounding_box(30.35, -97.70, &bbox));
    assert!(!is_within_bounding_box(30.5083, -97.6789, &bbox));
}

#[test]
fn test_same_field_ignores_case_and_padding() {
    assert!(same_field(&Some("Acme Corp".into()), &Some(" acme corp ".into())));
    assert!(!same_field(&Some("Acme Corp".into()), &Some("   ".into())));
}

#[test]
fn test_home_city_only_scores_1000() {
    let searcher = create_user(1, Some("Austin"), Some("78701"));
    let mut other = create_user(2, Some("austin"), Some("78702"));
    other.home_address.as_mut().unwrap().street = None;
    other.company_address = None;

    for mode in [SearchMode::City, SearchMode::All] {
        let (score, reasons) = calculate_match_score(&searcher, &candidate(other.clone(), None), mode);
        assert_eq!(score, 1000.0, "{} mode", mode);
        assert_eq!(
            reasons,
            MatchReasons {
                same_home_city: true,
                ..Default::default()
            }
        );
    }
}

#[test]
fn test_office_weight_depends_on_mode() {
    let searcher = create_user(1, None, None);
    let mut colleague = create_user(2, None, None);
    colleague.home_address = None;
    colleague.company_address = Some(Address {
        office_name: Some("acme corp".to_string()),
        ..Default::default()
    });

    let (office_score, office_reasons) =
        calculate_match_score(&searcher, &candidate(colleague.clone(), None), SearchMode::Office);
    let (all_score, all_reasons) =
        calculate_match_score(&searcher, &candidate(colleague, None), SearchMode::All);

    assert_eq!(office_score, 100.0);
    assert_eq!(all_score, 2000.0);
    assert!(office_reasons.same_office);
    assert!(all_reasons.same_office);
}

#[test]
fn test_proximity_bonus_by_distance() {
    let searcher = create_user(1, None, None);
    let mut other = create_user(2, None, None);
    other.home_address = None;
    other.company_address = None;

    let one_mile = candidate(other.clone(), Some(1609.344));
    let four_miles = candidate(other.clone(), Some(4.0 * 1609.344));
    let twelve_miles = candidate(other, Some(12.0 * 1609.344));

    let (near, near_reasons) = calculate_match_score(&searcher, &one_mile, SearchMode::All);
    let (far, _) = calculate_match_score(&searcher, &four_miles, SearchMode::All);
    let (beyond, _) = calculate_match_score(&searcher, &twelve_miles, SearchMode::NearbyWork);

    assert!((near - 180.0).abs() < 1e-9);
    assert!((far - 120.0).abs() < 1e-9);
    assert_eq!(beyond, 0.0);
    assert_eq!(near_reasons.work_distance_miles, Some(1.0));
}

#[test]
fn test_unrelated_fields_do_not_change_score() {
    let searcher = create_user(1, Some("Austin"), Some("78701"));
    let plain = create_user(2, Some("Austin"), None);
    let mut decorated = plain.clone();
    decorated.phone = Some("555-0100".to_string());
    decorated.profile_path = Some("/profiles/2.png".to_string());
    decorated.willing_to_take = vec![3];
    decorated.has_drivers_license = Some(true);

    for mode in [SearchMode::Office, SearchMode::Street, SearchMode::City, SearchMode::All] {
        let (a, _) = calculate_match_score(&searcher, &candidate(plain.clone(), None), mode);
        let (b, _) = calculate_match_score(&searcher, &candidate(decorated.clone(), None), mode);
        assert_eq!(a, b, "{} mode", mode);
    }
}

#[test]
fn test_weight_tables() {
    let office = ModeWeights::for_mode(SearchMode::Office);
    assert_eq!((office.home_street, office.office, office.work_street, office.work_city), (300.0, 100.0, 75.0, 50.0));

    let city = ModeWeights::for_mode(SearchMode::City);
    assert_eq!((city.office, city.work_street, city.work_city), (0.0, 0.0, 50.0));

    let nearby = ModeWeights::for_mode(SearchMode::NearbyHome);
    assert_eq!(nearby, ModeWeights::for_mode(SearchMode::All));
    assert_eq!(nearby.home_street, 0.0);
}

#[test]
fn test_rank_is_stable_and_truncated() {
    let ranked = rank(
        vec![
            scored(1, 50.0),
            scored(2, 300.0),
            scored(3, 50.0),
            scored(4, 1000.0),
            scored(5, 0.0),
            scored(6, 300.0),
            scored(7, 10.0),
        ],
        6,
    );

    let ids: Vec<i64> = ranked.iter().map(|m| m.user.id).collect();
    assert_eq!(ids, vec![4, 2, 6, 1, 3, 7]);
}

#[test]
fn test_score_and_rank_orders_by_score() {
    let matcher = Matcher::with_default_settings();
    let searcher = create_user(1, Some("Austin"), Some("78701"));

    let candidates = vec![
        candidate(create_user(2, Some("Dallas"), None), None),
        candidate(create_user(3, Some("Austin"), Some("78701")), None),
        candidate(create_user(4, Some("Austin"), None), None),
        candidate(create_user(1, Some("Austin"), Some("78701")), None),
    ];

    let ranked = matcher.score_and_rank(&searcher, candidates, SearchMode::City);
    let ids: Vec<i64> = ranked.iter().map(|m| m.user.id).collect();

    assert_eq!(ids, vec![3, 4, 2]);
}

#[test]
fn test_search_on_empty_pool_blocking() {
    let store = InMemoryStore::new().with_users(vec![create_user(1, Some("Austin"), None)]);
    let matcher = Matcher::with_default_settings();

    let result = tokio_test::block_on(matcher.search(&store, 1, SearchMode::City, None)).unwrap();

    assert!(result.matches.is_empty());
    assert_eq!(result.total_candidates, 0);
}
