//! PawMatch Algo - swipe-to-match engine for the PawMatch dog social app
//!
//! This library drives a single user's swipe session: it keeps a prefetched
//! queue of candidate dog profiles, applies the user's filters, scores likes
//! for compatibility and creates matches when the score clears the threshold.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::haversine_distance, CompatibilityScorer, EngineDeps, EngineState, ProfileQueue,
    SwipeEngine,
};
pub use error::{EngineError, ErrorKind};
pub use crate::models::{FilterState, Match, MatchResult, Profile, ScoringWeights, SwipeDirection};
