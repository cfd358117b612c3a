// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Coordinates, FilterState, Match, MatchResult, MatchStatus, MatchTier, Profile,
    ScoringThresholds, ScoringWeights, SwipeDecision, SwipeDirection, SwipeTelemetry, ANY,
};
pub use requests::{RecordScrollRequest, StartSessionRequest, UpdateLocationRequest};
pub use responses::{ErrorResponse, HealthResponse, SessionSnapshot};
