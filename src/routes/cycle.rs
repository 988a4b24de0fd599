use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{ensure_editable, ApiError, AppState, DateBody};
use crate::calendar::{CalendarDayView, CycleSummary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEnded {
    pub period_duration: u32,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_summary))
        .route("/cycle/day", get(get_cycle_day))
        .route("/period/start", post(mark_period_start))
        .route("/period/end", post(mark_period_end))
        .route("/period/cancel", post(cancel_period))
        .with_state(state)
}

async fn get_cycle_summary(State(state): State<AppState>) -> Result<Json<CycleSummary>, ApiError> {
    let today = state.today();
    Ok(Json(state.read(|engine| engine.summary(today))?))
}

async fn get_cycle_day(
    State(state): State<AppState>,
    Query(query): Query<DateBody>,
) -> Result<Json<CalendarDayView>, ApiError> {
    let today = state.today();
    Ok(Json(state.read(|engine| engine.day_view(query.date, today))?))
}

async fn mark_period_start(
    State(state): State<AppState>,
    Json(body): Json<DateBody>,
) -> Result<StatusCode, ApiError> {
    ensure_editable(body.date, state.today())?;
    state.write(|engine| engine.mark_period_start(body.date))?;
    Ok(StatusCode::CREATED)
}

async fn mark_period_end(
    State(state): State<AppState>,
    Json(body): Json<DateBody>,
) -> Result<Json<PeriodEnded>, ApiError> {
    ensure_editable(body.date, state.today())?;
    let period_duration = state.write(|engine| engine.mark_period_end(body.date))?;
    Ok(Json(PeriodEnded { period_duration }))
}

async fn cancel_period(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.write(|engine| engine.cancel_period())?;
    Ok(StatusCode::NO_CONTENT)
}
