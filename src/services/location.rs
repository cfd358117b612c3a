use std::sync::RwLock;

use async_trait::async_trait;

use crate::core::ports::LocationProvider;
use crate::error::EngineError;
use crate::models::Coordinates;

/// Last position reported by the user's device
///
/// The host pushes updates with [`DeviceLocation::update`]; when the user
/// revoked location access every lookup fails with a location error.
#[derive(Debug, Default)]
pub struct DeviceLocation {
    last_known: RwLock<Option<Coordinates>>,
    denied: RwLock<bool>,
}

impl DeviceLocation {
    pub fn new(initial: Option<Coordinates>) -> Self {
        Self {
            last_known: RwLock::new(initial),
            denied: RwLock::new(false),
        }
    }

    pub fn update(&self, position: Coordinates) {
        *self.last_known.write().unwrap_or_else(|e| e.into_inner()) = Some(position);
        *self.denied.write().unwrap_or_else(|e| e.into_inner()) = false;
    }

    pub fn set_denied(&self, denied: bool) {
        *self.denied.write().unwrap_or_else(|e| e.into_inner()) = denied;
    }
}

#[async_trait]
impl LocationProvider for DeviceLocation {
    async fn last_known_location(&self) -> Result<Option<Coordinates>, EngineError> {
        if *self.denied.read().unwrap_or_else(|e| e.into_inner()) {
            return Err(EngineError::Location("location access denied".to_string()));
        }
        Ok(*self.last_known.read().unwrap_or_else(|e| e.into_inner()))
    }
}
