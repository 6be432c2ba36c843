use std::cmp::Ordering;
use crate::models::{RankedMatch, ScoredCandidate};

/// Order scored candidates and keep the best `limit`
///
/// Sorting is stable, so equal scores keep the order the selector produced
/// (ascending distance for radius queries). The numeric score is dropped
/// from the output.
pub fn rank(mut scored: Vec<ScoredCandidate>, limit: usize) -> Vec<RankedMatch> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|s| RankedMatch {
            user: s.user,
            reasons: s.reasons,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchReasons, User};

    fn scored(id: i64, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            user: User {
                id,
                first_name: format!("User{}", id),
                last_name: "Test".into(),
                email: format!("user{}@example.com", id),
                phone: None,
                role: "passenger".into(),
                willing_to_take: vec![],
                has_drivers_license: None,
                profile_path: None,
                home_address: None,
                company_address: None,
                created_at: None,
            },
            score,
            reasons: MatchReasons::default(),
        }
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let ranked = rank(vec![scored(1, 50.0), scored(2, 1500.0), scored(3, 300.0)], 6);
        let ids: Vec<i64> = ranked.iter().map(|r| r.user.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_keep_selector_order() {
        let ranked = rank(
            vec![scored(4, 100.0), scored(9, 100.0), scored(2, 100.0), scored(5, 200.0)],
            6,
        );
        let ids: Vec<i64> = ranked.iter().map(|r| r.user.id).collect();
        assert_eq!(ids, vec![5, 4, 9, 2]);
    }

    #[test]
    fn test_respects_limit() {
        let candidates: Vec<ScoredCandidate> = (0..20).map(|i| scored(i, i as f64)).collect();
        let ranked = rank(candidates, 6);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].user.id, 19);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new(), 6).is_empty());
    }
}
