use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

use crate::core::ports::SwipeLedger;
use crate::error::EngineError;
use crate::models::SwipeDecision;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl From<PostgresError> for EngineError {
    fn from(err: PostgresError) -> Self {
        match &err {
            PostgresError::SqlxError(sqlx::Error::Database(db)) if db.code().as_deref() == Some("42501") => {
                // insufficient_privilege
                EngineError::Permission(err.to_string())
            }
            PostgresError::SqlxError(sqlx::Error::Io(_))
            | PostgresError::SqlxError(sqlx::Error::PoolTimedOut)
            | PostgresError::SqlxError(sqlx::Error::PoolClosed)
            | PostgresError::SqlxError(sqlx::Error::Tls(_)) => EngineError::Network(err.to_string()),
            PostgresError::SqlxError(sqlx::Error::Database(_)) => EngineError::Network(err.to_string()),
            _ => EngineError::General(err.to_string()),
        }
    }
}

/// PostgreSQL-backed swipe ledger
///
/// Every decision becomes one row in `swipe_decisions`, keyed by
/// (swiper, swiped). Retracting a decision deletes that row.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Create a client whose pool connects on first use, without migrating
    pub fn connect_lazy(database_url: &str) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Record a swipe decision
    ///
    /// Uses INSERT ... ON CONFLICT so that a decision re-made after an undo
    /// replaces the retracted one.
    pub async fn record_decision(&self, decision: &SwipeDecision) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO swipe_decisions (
                swiper_id, swiped_id, is_like, is_super_like, compatibility_score,
                view_duration_ms, photos_viewed, scroll_depth, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (swiper_id, swiped_id)
            DO UPDATE SET
                is_like = EXCLUDED.is_like,
                is_super_like = EXCLUDED.is_super_like,
                compatibility_score = EXCLUDED.compatibility_score,
                view_duration_ms = EXCLUDED.view_duration_ms,
                photos_viewed = EXCLUDED.photos_viewed,
                scroll_depth = EXCLUDED.scroll_depth,
                created_at = EXCLUDED.created_at
        "#;

        sqlx::query(query)
            .bind(&decision.swiper_id)
            .bind(&decision.swiped_id)
            .bind(decision.is_like)
            .bind(decision.is_super_like)
            .bind(decision.compatibility_score)
            .bind(decision.telemetry.view_duration_ms as i64)
            .bind(decision.telemetry.photos_viewed as i32)
            .bind(decision.telemetry.scroll_depth as i32)
            .bind(decision.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} (like: {}, super: {})",
            decision.swiper_id,
            decision.swiped_id,
            decision.is_like,
            decision.is_super_like
        );

        Ok(())
    }

    /// Remove a swipe decision, returning whether a row existed
    pub async fn remove_decision(
        &self,
        swiper_id: &str,
        swiped_id: &str,
    ) -> Result<bool, PostgresError> {
        let query = r#"
            DELETE FROM swipe_decisions
            WHERE swiper_id = $1 AND swiped_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(swiper_id)
            .bind(swiped_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl SwipeLedger for PostgresClient {
    async fn append(&self, decision: &SwipeDecision) -> Result<(), EngineError> {
        Ok(self.record_decision(decision).await?)
    }

    async fn retract(&self, swiper_id: &str, swiped_id: &str) -> Result<(), EngineError> {
        if !self.remove_decision(swiper_id, swiped_id).await? {
            tracing::debug!("No swipe to retract: {} -> {}", swiper_id, swiped_id);
        }
        Ok(())
    }
}
