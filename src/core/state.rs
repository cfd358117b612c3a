use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorKind};
use crate::models::{Match, Profile};

/// A freshly created match together with the profile it was made with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    #[serde(rename = "match")]
    pub record: Match,
    pub profile: Profile,
}

/// Externally observable engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    Initial,
    Loading,
    Success,
    NoMoreProfiles,
    Match {
        detail: Box<MatchDetail>,
        #[serde(rename = "isSuper")]
        is_super: bool,
    },
    Error {
        message: String,
        kind: ErrorKind,
    },
}

impl EngineState {
    pub fn from_error(error: &EngineError) -> Self {
        EngineState::Error {
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Where the displayed candidate is in the decision flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionPhase {
    /// No candidate on screen
    Idle,
    Displayed,
    Deciding,
    Recorded,
    MatchPending,
    NoMatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization_is_tagged() {
        let json = serde_json::to_value(EngineState::NoMoreProfiles).unwrap();
        assert_eq!(json["status"], "NO_MORE_PROFILES");

        let err = EngineState::from_error(&EngineError::Permission("denied".into()));
        let json = serde_json::to_value(err).unwrap();
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["kind"], "PERMISSION_ERROR");
    }
}
