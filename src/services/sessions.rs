use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::core::SwipeEngine;
use crate::services::location::DeviceLocation;

/// A live swipe session and the location feed it reads from
#[derive(Clone)]
pub struct SessionHandle {
    pub engine: SwipeEngine,
    pub location: Arc<DeviceLocation>,
}

/// Live sessions keyed by user id
///
/// Sessions idle for longer than the configured window are evicted. Every
/// evicted, replaced or removed session is shut down.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Cache<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(idle_timeout)
            .eviction_listener(|user_id: Arc<String>, handle: SessionHandle, cause| {
                tracing::debug!("Closing session for {} ({:?})", user_id, cause);
                handle.engine.shutdown();
            })
            .build();

        Self { sessions }
    }

    pub async fn get(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions.get(user_id).await
    }

    /// Register a session, shutting down any previous one for the user
    pub async fn insert(&self, user_id: impl Into<String>, handle: SessionHandle) {
        self.sessions.insert(user_id.into(), handle).await;
    }

    pub async fn remove(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions.remove(user_id).await
    }
}
