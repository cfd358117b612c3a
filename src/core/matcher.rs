use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::core::ports::MatchRepository;
use crate::error::EngineError;
use crate::models::{Match, MatchResult, MatchStatus, MatchTier, Profile, ScoringThresholds};

/// Default time a pending match stays open
pub const DEFAULT_MATCH_EXPIRY_HOURS: i64 = 168;

/// Promotes an accepted [`MatchResult`] into a persisted [`Match`]
#[derive(Clone)]
pub struct MatchCreator {
    repository: Arc<dyn MatchRepository>,
    thresholds: ScoringThresholds,
    expiry: Duration,
}

impl MatchCreator {
    pub fn new(
        repository: Arc<dyn MatchRepository>,
        thresholds: ScoringThresholds,
        expiry: Duration,
    ) -> Self {
        Self {
            repository,
            thresholds,
            expiry,
        }
    }

    /// Build the pending match without persisting it
    ///
    /// The swiper's profile is recorded as the initiator.
    pub fn build_match(&self, result: &MatchResult, swiper: &Profile, swiped: &Profile) -> Match {
        let now = Utc::now();

        Match {
            id: Uuid::new_v4().to_string(),
            user1_id: swiper.owner_id.clone(),
            user2_id: swiped.owner_id.clone(),
            profile1_id: swiper.id.clone(),
            profile2_id: swiped.id.clone(),
            compatibility_score: result.score,
            match_reasons: result.reasons.clone(),
            status: MatchStatus::Pending,
            timestamp: now,
            location_distance: result.distance_km,
            match_tier: MatchTier::for_score(result.score, &self.thresholds),
            initiator_profile_id: swiper.id.clone(),
            expires_at: now + self.expiry,
        }
    }

    /// Build and persist a match
    pub async fn create_match(
        &self,
        result: &MatchResult,
        swiper: &Profile,
        swiped: &Profile,
    ) -> Result<Match, EngineError> {
        let m = self.build_match(result, swiper, swiped);
        self.repository.create(&m).await?;

        tracing::info!(
            "Created {:?} match {} between {} and {} (score {:.2})",
            m.match_tier,
            m.id,
            m.profile1_id,
            m.profile2_id,
            m.compatibility_score
        );

        Ok(m)
    }
}
