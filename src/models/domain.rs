use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::EngineError;

/// Wildcard entry accepted by every category filter
pub const ANY: &str = "ANY";

/// Geographic position in degrees
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

/// Dog profile offered to the swiper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    pub age: u8,
    pub size: String,
    #[serde(rename = "energyLevel")]
    pub energy_level: String,
    pub breed: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(rename = "photoUrls", default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// The user's current matching constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_age_range"))]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[validate(range(min = 0.0))]
    pub max_distance_km: f64,
    pub min_age: u8,
    pub max_age: u8,
    pub energy_levels: BTreeSet<String>,
    pub breeds: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
}

fn validate_age_range(filter: &FilterState) -> Result<(), ValidationError> {
    if filter.min_age > filter.max_age {
        return Err(ValidationError::new("min_age_exceeds_max_age"));
    }
    Ok(())
}

impl FilterState {
    /// Filter that lets every candidate through
    pub fn permissive() -> Self {
        let any = || BTreeSet::from([ANY.to_string()]);
        Self {
            max_distance_km: 50.0,
            min_age: 0,
            max_age: u8::MAX,
            energy_levels: any(),
            breeds: any(),
            sizes: any(),
        }
    }

    /// Validate the invariants, returning the filter on success
    pub fn checked(self) -> Result<Self, EngineError> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::permissive()
    }
}

/// Direction of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwipeDirection {
    Like,
    SuperLike,
    Dislike,
}

impl SwipeDirection {
    pub fn is_like(self) -> bool {
        !matches!(self, SwipeDirection::Dislike)
    }
}

/// Engagement captured while a candidate was on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeTelemetry {
    pub view_duration_ms: u64,
    pub photos_viewed: u32,
    pub scroll_depth: u32,
}

/// Immutable record of one swipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeDecision {
    pub swiper_id: String,
    pub swiped_id: String,
    pub is_like: bool,
    pub is_super_like: bool,
    pub compatibility_score: f64,
    pub telemetry: SwipeTelemetry,
    pub created_at: DateTime<Utc>,
}

/// Output of the compatibility scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub is_match: bool,
    pub score: f64,
    pub reasons: Vec<String>,
    pub distance_km: Option<f64>,
    pub warnings: Vec<String>,
    /// Catalog mismatches, only populated when `is_match` is false
    pub negative_reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Pending,
    Active,
    Declined,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    Normal,
    HighCompatibility,
    PerfectMatch,
}

/// Scoring weights for the four compatibility criteria
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub energy: f64,
    pub size: f64,
    pub age: f64,
    pub distance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            energy: 0.25,
            size: 0.25,
            age: 0.25,
            distance: 0.25,
        }
    }
}

/// Score thresholds that gate matching and tiering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringThresholds {
    pub is_match: f64,
    pub high_compatibility: f64,
    pub perfect_match: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            is_match: 0.7,
            high_compatibility: 0.8,
            perfect_match: 0.95,
        }
    }
}

impl MatchTier {
    /// Tier for an accepted match with the given score
    pub fn for_score(score: f64, thresholds: &ScoringThresholds) -> Self {
        if score >= thresholds.perfect_match {
            MatchTier::PerfectMatch
        } else if score >= thresholds.high_compatibility {
            MatchTier::HighCompatibility
        } else {
            MatchTier::Normal
        }
    }
}

/// A persisted mutual match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub profile1_id: String,
    pub profile2_id: String,
    pub compatibility_score: f64,
    pub match_reasons: Vec<String>,
    pub status: MatchStatus,
    pub timestamp: DateTime<Utc>,
    pub location_distance: Option<f64>,
    pub match_tier: MatchTier,
    pub initiator_profile_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Match {
    /// A pending match is expired once its window has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MatchStatus::Pending && now >= self.expires_at
    }

    /// Move to `EXPIRED` if the expiry predicate holds
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            self.status = MatchStatus::Expired;
            true
        } else {
            false
        }
    }

    /// Apply a lifecycle transition. Only pending matches can move.
    pub fn transition(&mut self, to: MatchStatus) -> Result<(), EngineError> {
        match (self.status, to) {
            (MatchStatus::Pending, MatchStatus::Active)
            | (MatchStatus::Pending, MatchStatus::Declined)
            | (MatchStatus::Pending, MatchStatus::Expired) => {
                self.status = to;
                Ok(())
            }
            (from, to) => Err(EngineError::General(format!(
                "Illegal match transition {:?} -> {:?}",
                from, to
            ))),
        }
    }
}
