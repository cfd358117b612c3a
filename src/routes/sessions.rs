use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::EngineSettings;
use crate::core::{CompatibilityScorer, EngineDeps, SwipeEngine};
use crate::models::{
    Coordinates, ErrorResponse, FilterState, HealthResponse, RecordScrollRequest, SessionSnapshot,
    StartSessionRequest, UpdateLocationRequest,
};
use crate::services::{
    AppwriteClient, AppwriteProfileSource, DeviceLocation, PostgresClient, SessionHandle,
    SessionRegistry,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub appwrite: Arc<AppwriteClient>,
    pub postgres: Arc<PostgresClient>,
    pub sessions: SessionRegistry,
    pub engine_settings: EngineSettings,
    pub scorer: CompatibilityScorer,
}

/// Configure all session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/sessions", web::post().to(start_session))
        .route("/sessions/{user_id}", web::get().to(get_session))
        .route("/sessions/{user_id}", web::delete().to(end_session))
        .route("/sessions/{user_id}/like", web::post().to(like))
        .route("/sessions/{user_id}/dislike", web::post().to(dislike))
        .route("/sessions/{user_id}/super-like", web::post().to(super_like))
        .route("/sessions/{user_id}/undo", web::post().to(undo))
        .route("/sessions/{user_id}/refresh", web::post().to(refresh))
        .route("/sessions/{user_id}/match/acknowledge", web::post().to(acknowledge_match))
        .route("/sessions/{user_id}/filters", web::put().to(update_filters))
        .route("/sessions/{user_id}/location", web::put().to(update_location))
        .route("/sessions/{user_id}/telemetry/photo", web::post().to(record_photo))
        .route("/sessions/{user_id}/telemetry/scroll", web::post().to(record_scroll));
}

/// Swipe commands that share the same lookup and response
#[derive(Debug, Clone, Copy)]
enum SessionCommand {
    Like,
    Dislike,
    SuperLike,
    Undo,
    Refresh,
    AcknowledgeMatch,
}

fn snapshot(user_id: &str, engine: &SwipeEngine) -> SessionSnapshot {
    SessionSnapshot {
        user_id: user_id.to_string(),
        state: engine.current_state(),
        candidate: engine.current_candidate(),
    }
}

fn session_not_found(user_id: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Session not found".to_string(),
        message: format!("No active session for user {}", user_id),
        status_code: 404,
    })
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Start a swipe session
///
/// POST /api/v1/sessions
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "filters": {
///     "maxDistanceKm": 25.0, "minAge": 1, "maxAge": 10,
///     "energyLevels": ["ANY"], "breeds": ["ANY"], "sizes": ["SMALL", "MEDIUM"]
///   }
/// }
/// ```
async fn start_session(
    state: web::Data<AppState>,
    req: web::Json<StartSessionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for start_session request: {:?}", errors);
        return validation_failed(errors);
    }

    let user_id = &req.user_id;

    let swiper = match state.appwrite.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch user profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let location = Arc::new(DeviceLocation::new(swiper.location));
    let deps = EngineDeps {
        source: Arc::new(AppwriteProfileSource::new(state.appwrite.clone(), user_id.clone())),
        locator: location.clone(),
        ledger: state.postgres.clone(),
        matches: state.appwrite.clone(),
    };

    let engine = SwipeEngine::new(
        swiper,
        req.filters.clone().unwrap_or_default(),
        deps,
        state.engine_settings.clone(),
        state.scorer,
    );

    state
        .sessions
        .insert(user_id.clone(), SessionHandle { engine: engine.clone(), location })
        .await;
    engine.start().await;

    tracing::info!("Started swipe session for user {}", user_id);

    HttpResponse::Ok().json(snapshot(user_id, &engine))
}

async fn get_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    match state.sessions.get(&user_id).await {
        Some(handle) => HttpResponse::Ok().json(snapshot(&user_id, &handle.engine)),
        None => session_not_found(&user_id),
    }
}

async fn end_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    match state.sessions.remove(&user_id).await {
        Some(_) => HttpResponse::NoContent().finish(),
        None => session_not_found(&user_id),
    }
}

async fn run_command(state: &AppState, user_id: &str, command: SessionCommand) -> HttpResponse {
    let Some(handle) = state.sessions.get(user_id).await else {
        return session_not_found(user_id);
    };
    let engine = &handle.engine;

    tracing::debug!("Session {} command {:?}", user_id, command);

    match command {
        SessionCommand::Like => engine.like().await,
        SessionCommand::Dislike => engine.dislike().await,
        SessionCommand::SuperLike => engine.super_like().await,
        SessionCommand::Undo => engine.undo().await,
        SessionCommand::Refresh => engine.refresh().await,
        SessionCommand::AcknowledgeMatch => engine.acknowledge_match().await,
    }

    HttpResponse::Ok().json(snapshot(user_id, engine))
}

async fn like(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::Like).await
}

async fn dislike(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::Dislike).await
}

async fn super_like(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::SuperLike).await
}

async fn undo(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::Undo).await
}

async fn refresh(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::Refresh).await
}

async fn acknowledge_match(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    run_command(&state, &path.into_inner(), SessionCommand::AcknowledgeMatch).await
}

/// Replace the session filters
///
/// PUT /api/v1/sessions/{userId}/filters
async fn update_filters(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<FilterState>,
) -> impl Responder {
    let user_id = path.into_inner();
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let Some(handle) = state.sessions.get(&user_id).await else {
        return session_not_found(&user_id);
    };

    if let Err(e) = handle.engine.update_filters(req.into_inner()).await {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid filters".to_string(),
            message: e.to_string(),
            status_code: 400,
        });
    }

    HttpResponse::Ok().json(snapshot(&user_id, &handle.engine))
}

async fn update_location(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateLocationRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let Some(handle) = state.sessions.get(&user_id).await else {
        return session_not_found(&user_id);
    };

    handle.location.update(Coordinates::new(req.latitude, req.longitude));
    HttpResponse::NoContent().finish()
}

async fn record_photo(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    let Some(handle) = state.sessions.get(&user_id).await else {
        return session_not_found(&user_id);
    };

    handle.engine.record_photo_viewed();
    HttpResponse::NoContent().finish()
}

async fn record_scroll(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<RecordScrollRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    let Some(handle) = state.sessions.get(&user_id).await else {
        return session_not_found(&user_id);
    };

    handle.engine.record_scroll(req.depth);
    HttpResponse::NoContent().finish()
}
