//! Collaborator contracts consumed by the swipe engine.
//!
//! Storage, transport and device services live outside the engine; it only
//! talks to them through these traits. Implementations classify their own
//! failures into [`EngineError`] variants.

use async_trait::async_trait;

use crate::core::distance::haversine_distance;
use crate::error::EngineError;
use crate::models::{Coordinates, Match, Profile, SwipeDecision};

/// Supplies batches of candidate profiles
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_batch(&self, size: usize) -> Result<Vec<Profile>, EngineError>;
}

/// Device position and distance computation
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn last_known_location(&self) -> Result<Option<Coordinates>, EngineError>;

    fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64 {
        haversine_distance(a, b)
    }
}

/// Append-only ledger of swipe decisions
#[async_trait]
pub trait SwipeLedger: Send + Sync {
    async fn append(&self, decision: &SwipeDecision) -> Result<(), EngineError>;

    /// Retract the decision `swiper_id` made about `swiped_id`
    async fn retract(&self, swiper_id: &str, swiped_id: &str) -> Result<(), EngineError>;
}

/// Owner of persisted matches
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create(&self, m: &Match) -> Result<(), EngineError>;
}
