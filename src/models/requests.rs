use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::FilterState;

/// Request to start a swipe session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(nested)]
    #[serde(default)]
    pub filters: Option<FilterState>,
}

/// Host-reported device position
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Scroll depth reached on the current candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordScrollRequest {
    pub depth: u32,
}
