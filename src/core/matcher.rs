use crate::core::{ranking::rank, scoring::calculate_match_score, selector::CandidateSelector};
use crate::error::SearchError;
use crate::models::{
    Candidate, MatchSettings, MatchSummary, RankedMatch, ScoredCandidate, SearchMode, User, UserId,
};
use crate::services::AddressStore;

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<MatchSummary>,
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Load the searcher with both addresses
/// 2. Candidate selection (exact match or radius query)
/// 3. Scoring against the searcher
/// 4. Ranking and truncation
/// 5. Projection to the public summary (home street dropped)
///
/// Holds no per-request state; one instance serves all requests.
#[derive(Debug, Clone)]
pub struct Matcher {
    selector: CandidateSelector,
    result_limit: usize,
}

impl Matcher {
    pub fn new(settings: MatchSettings) -> Self {
        Self {
            selector: CandidateSelector::new(&settings),
            result_limit: settings.result_limit,
        }
    }

    pub fn with_default_settings() -> Self {
        Self::new(MatchSettings::default())
    }

    /// Find the best commute matches for a user
    ///
    /// # Arguments
    /// * `store` - Address store to read the searcher and candidates from
    /// * `searcher_id` - The user searching
    /// * `mode` - Pool selection strategy
    /// * `radius_miles` - Radius for the `nearby*` modes, defaults from settings
    pub async fn search(
        &self,
        store: &dyn AddressStore,
        searcher_id: UserId,
        mode: SearchMode,
        radius_miles: Option<f64>,
    ) -> Result<MatchResult, SearchError> {
        // Stage 1: Searcher
        let searcher = store
            .get_user_with_addresses(searcher_id)
            .await?
            .ok_or_else(|| SearchError::NotFound(searcher_id.to_string()))?;

        // Stage 2: Candidate pool
        let candidates = self
            .selector
            .select_candidates(store, &searcher, mode, radius_miles)
            .await?;
        let total_candidates = candidates.len();

        // Stages 3-4: Score and rank
        let ranked = self.score_and_rank(&searcher, candidates, mode);

        // Stage 5: Public projection
        let matches = ranked.into_iter().map(MatchSummary::from).collect();

        Ok(MatchResult {
            matches,
            total_candidates,
        })
    }

    /// Score every candidate and keep the top results
    ///
    /// Pure: the same inputs always give the same order and reasons.
    pub fn score_and_rank(
        &self,
        searcher: &User,
        candidates: Vec<Candidate>,
        mode: SearchMode,
    ) -> Vec<RankedMatch> {
        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.user.id != searcher.id)
            .map(|candidate| {
                let (score, reasons) = calculate_match_score(searcher, &candidate, mode);
                ScoredCandidate {
                    user: candidate.user,
                    score,
                    reasons,
                }
            })
            .collect();

        rank(scored, self.result_limit)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Coordinates};

    fn create_user(id: i64, home_city: &str, work_city: &str) -> User {
        User {
            id,
            first_name: format!("User{}", id),
            last_name: "Test".into(),
            email: format!("user{}@example.com", id),
            phone: None,
            role: "driver".into(),
            willing_to_take: vec![1, 2],
            has_drivers_license: Some(true),
            profile_path: None,
            home_address: Some(Address {
                street: Some(format!("{} Home St", id)),
                city: Some(home_city.into()),
                zipcode: Some("78701".into()),
                ..Default::default()
            }),
            company_address: Some(Address {
                city: Some(work_city.into()),
                coordinates: Some(Coordinates::new(30.2672, -97.7431)),
                ..Default::default()
            }),
            created_at: None,
        }
    }

    fn candidate(user: User) -> Candidate {
        Candidate {
            user,
            distance_meters: None,
        }
    }

    #[test]
    fn test_score_and_rank_orders_by_affinity() {
        let matcher = Matcher::with_default_settings();
        let searcher = create_user(1, "Austin", "Austin");

        let candidates = vec![
            candidate(create_user(2, "Dallas", "Austin")),
            candidate(create_user(3, "Austin", "Austin")),
            candidate(create_user(4, "Houston", "Houston")),
        ];

        let ranked = matcher.score_and_rank(&searcher, candidates, SearchMode::City);
        let ids: Vec<i64> = ranked.iter().map(|r| r.user.id).collect();

        assert_eq!(ids, vec![3, 2, 4]);
        assert!(ranked[0].reasons.same_home_city);
        assert!(ranked[0].reasons.same_work_city);
    }

    #[test]
    fn test_searcher_is_never_ranked() {
        let matcher = Matcher::with_default_settings();
        let searcher = create_user(1, "Austin", "Austin");

        let candidates = vec![
            candidate(searcher.clone()),
            candidate(create_user(2, "Austin", "Austin")),
        ];

        let ranked = matcher.score_and_rank(&searcher, candidates, SearchMode::City);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].user.id, 2);
    }

    #[test]
    fn test_respects_result_limit() {
        let matcher = Matcher::with_default_settings();
        let searcher = create_user(1, "Austin", "Austin");

        let candidates: Vec<Candidate> = (2..30)
            .map(|i| candidate(create_user(i, "Austin", "Austin")))
            .collect();

        let ranked = matcher.score_and_rank(&searcher, candidates, SearchMode::City);
        assert_eq!(ranked.len(), 6);
        // All tie, so selector order wins
        let ids: Vec<i64> = ranked.iter().map(|r| r.user.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5, 6, 7]);
    }
}
