//! HTTP request handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use dwell_api::{
    API_VERSION, HealthStatus, HeartbeatResponse, ProgressStatus, ProgressView, StartResponse,
    StudySummary,
};
use dwell_util::SubsectionId;

use super::{ApiError, AppContext, Learner};

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let store_healthy = ctx.tracker.is_store_healthy();
    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthStatus {
            api_version: API_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            store_healthy,
        }),
    )
}

/// POST /subsections/progress/:id/start
pub async fn start(
    State(ctx): State<AppContext>,
    Learner(user_id): Learner,
    Path(id): Path<i64>,
) -> Result<Json<StartResponse>, ApiError> {
    let response = ctx
        .tracker
        .start(user_id, SubsectionId::new(id), ctx.clock.now())
        .await?;
    Ok(Json(response))
}

/// POST /subsections/progress/:id/heartbeat
pub async fn heartbeat(
    State(ctx): State<AppContext>,
    Learner(user_id): Learner,
    Path(id): Path<i64>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let response = ctx
        .tracker
        .heartbeat(user_id, SubsectionId::new(id), ctx.clock.now())
        .await?;
    Ok(Json(response))
}

/// POST /subsections/progress/:id/complete
pub async fn complete(
    State(ctx): State<AppContext>,
    Learner(user_id): Learner,
    Path(id): Path<i64>,
) -> Result<Json<ProgressView>, ApiError> {
    let view = ctx
        .tracker
        .complete(user_id, SubsectionId::new(id), ctx.clock.now())
        .await?;
    Ok(Json(view))
}

/// GET /subsections/progress/:id/status
pub async fn status(
    State(ctx): State<AppContext>,
    Learner(user_id): Learner,
    Path(id): Path<i64>,
) -> Result<Json<ProgressStatus>, ApiError> {
    Ok(Json(ctx.tracker.status(user_id, SubsectionId::new(id))?))
}

/// GET /subsections/progress/summary
pub async fn summary(
    State(ctx): State<AppContext>,
    Learner(user_id): Learner,
) -> Result<Json<StudySummary>, ApiError> {
    Ok(Json(ctx.tracker.summary(user_id)?))
}
