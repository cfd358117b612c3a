use crate::core::distance::distance_between;
use crate::models::{MatchResult, MatchTier, Profile, ScoringThresholds, ScoringWeights};

/// Maximum age gap (years) still counted as "close in age"
pub const CLOSE_AGE_YEARS: u8 = 2;

/// Maximum distance (km) still counted as "nearby"
pub const NEARBY_KM: f64 = 10.0;

pub const REASON_ENERGY: &str = "Matching energy levels";
pub const REASON_SIZE: &str = "Similar size";
pub const REASON_AGE: &str = "Close in age";
pub const REASON_NEARBY: &str = "Nearby location";

pub const MISMATCH_ENERGY: &str = "Different energy levels";
pub const MISMATCH_AGE: &str = "Age gap too large";
pub const MISMATCH_SIZE: &str = "Size mismatch";

pub const WARNING_NO_DISTANCE: &str = "Distance unavailable";

/// Pure compatibility scorer for a pair of profiles
///
/// Scoring formula:
/// score = sum(weight of satisfied criteria) / sum(weight of applicable criteria)
///
/// Criteria: equal energy level, equal size, age gap <= 2 years and
/// distance <= 10 km. Distance is only applicable when both profiles have
/// coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
    thresholds: ScoringThresholds,
}

impl CompatibilityScorer {
    pub fn new(weights: ScoringWeights, thresholds: ScoringThresholds) -> Self {
        Self { weights, thresholds }
    }

    pub fn thresholds(&self) -> &ScoringThresholds {
        &self.thresholds
    }

    /// Tier of an accepted match
    pub fn tier(&self, result: &MatchResult) -> MatchTier {
        MatchTier::for_score(result.score, &self.thresholds)
    }

    /// Score `a` against `b`
    pub fn score(&self, a: &Profile, b: &Profile) -> MatchResult {
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();
        let mut satisfied = 0.0;
        let mut applicable = 0.0;

        let energy_match = a.energy_level == b.energy_level;
        applicable += self.weights.energy;
        if energy_match {
            satisfied += self.weights.energy;
            reasons.push(REASON_ENERGY.to_string());
        }

        let size_match = a.size == b.size;
        applicable += self.weights.size;
        if size_match {
            satisfied += self.weights.size;
            reasons.push(REASON_SIZE.to_string());
        }

        let age_close = a.age.abs_diff(b.age) <= CLOSE_AGE_YEARS;
        applicable += self.weights.age;
        if age_close {
            satisfied += self.weights.age;
            reasons.push(REASON_AGE.to_string());
        }

        let distance_km = distance_between(a.location, b.location);
        match distance_km {
            Some(d) => {
                applicable += self.weights.distance;
                if d <= NEARBY_KM {
                    satisfied += self.weights.distance;
                    reasons.push(REASON_NEARBY.to_string());
                }
            }
            None => warnings.push(WARNING_NO_DISTANCE.to_string()),
        }

        let score = if applicable > 0.0 {
            (satisfied / applicable).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let is_match = score >= self.thresholds.is_match;

        let mut negative_reasons = Vec::new();
        if !is_match {
            if !energy_match {
                negative_reasons.push(MISMATCH_ENERGY.to_string());
            }
            if !age_close {
                negative_reasons.push(MISMATCH_AGE.to_string());
            }
            if !size_match {
                negative_reasons.push(MISMATCH_SIZE.to_string());
            }
        }

        MatchResult {
            is_match,
            score,
            reasons,
            distance_km,
            warnings,
            negative_reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn create_test_profile(age: u8, size: &str, energy: &str, location: Option<Coordinates>) -> Profile {
        Profile {
            id: format!("dog-{}-{}", age, size),
            owner_id: "owner".to_string(),
            name: "Test Dog".to_string(),
            age,
            size: size.to_string(),
            energy_level: energy.to_string(),
            breed: "Beagle".to_string(),
            location,
            photo_urls: vec![],
            bio: None,
        }
    }

    fn berlin() -> Option<Coordinates> {
        Some(Coordinates::new(52.5200, 13.4050))
    }

    fn berlin_5km_east() -> Option<Coordinates> {
        // ~5 km east along the same parallel
        Some(Coordinates::new(52.5200, 13.4788))
    }

    fn hamburg() -> Option<Coordinates> {
        Some(Coordinates::new(53.5511, 9.9937))
    }

    #[test]
    fn test_all_four_reasons() {
        let scorer = CompatibilityScorer::default();
        let a = create_test_profile(3, "MEDIUM", "HIGH", berlin());
        let b = create_test_profile(4, "MEDIUM", "HIGH", berlin_5km_east());

        let result = scorer.score(&a, &b);

        assert_eq!(
            result.reasons,
            vec![REASON_ENERGY, REASON_SIZE, REASON_AGE, REASON_NEARBY]
        );
        assert!(result.score >= 0.7);
        assert!(result.is_match);
        assert!(result.negative_reasons.is_empty());
        assert_eq!(scorer.tier(&result), MatchTier::PerfectMatch);
    }

    #[test]
    fn test_three_of_four_is_normal_match() {
        let scorer = CompatibilityScorer::default();
        let a = create_test_profile(3, "MEDIUM", "HIGH", berlin());
        let b = create_test_profile(4, "MEDIUM", "HIGH", hamburg());

        let result = scorer.score(&a, &b);

        assert!((result.score - 0.75).abs() < 1e-9);
        assert!(result.is_match);
        assert_eq!(scorer.tier(&result), MatchTier::Normal);
    }

    #[test]
    fn test_no_match_lists_unsatisfied_catalog() {
        let scorer = CompatibilityScorer::default();
        let a = create_test_profile(2, "SMALL", "HIGH", berlin());
        let b = create_test_profile(9, "SMALL", "LOW", berlin());

        let result = scorer.score(&a, &b);

        assert!(!result.is_match);
        assert_eq!(result.negative_reasons, vec![MISMATCH_ENERGY, MISMATCH_AGE]);
    }

    #[test]
    fn test_missing_location_is_excluded() {
        let scorer = CompatibilityScorer::default();
        let a = create_test_profile(3, "MEDIUM", "HIGH", None);
        let b = create_test_profile(3, "MEDIUM", "HIGH", berlin());

        let result = scorer.score(&a, &b);

        assert!(result.distance_km.is_none());
        assert_eq!(result.warnings, vec![WARNING_NO_DISTANCE]);
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_symmetric() {
        let scorer = CompatibilityScorer::default();
        let a = create_test_profile(3, "LARGE", "HIGH", berlin());
        let b = create_test_profile(6, "LARGE", "MEDIUM", berlin_5km_east());

        let ab = scorer.score(&a, &b);
        let ba = scorer.score(&b, &a);

        assert_eq!(ab.score, ba.score);
        assert_eq!(ab.reasons, ba.reasons);
        assert_eq!(ab.is_match, ba.is_match);
    }
}
