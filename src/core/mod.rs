// Core engine exports
pub mod distance;
pub mod engine;
pub mod filters;
pub mod matcher;
pub mod ports;
pub mod queue;
pub mod scoring;
pub mod state;
pub mod undo;

pub use distance::{distance_between, haversine_distance};
pub use engine::{EngineDeps, SwipeEngine};
pub use filters::{accepts, passes_filter};
pub use matcher::MatchCreator;
pub use ports::{LocationProvider, MatchRepository, ProfileSource, SwipeLedger};
pub use queue::ProfileQueue;
pub use scoring::CompatibilityScorer;
pub use state::{DecisionPhase, EngineState, MatchDetail};
pub use undo::{UndoBuffer, UndoEntry};
