use axum::{
    Router,
    routing::{get, post},
    extract::{State, Query},
    Json,
    http::StatusCode,
};
use serde::Deserialize;

use super::{ensure_editable, ApiError, AppState, DateBody};
use crate::date::CalendarDate;
use crate::models::{DailyLog, NewDailyLog};

#[derive(Deserialize)]
pub struct NewFlow {
    pub date: CalendarDate,
    pub intensity: u8,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/flow", post(log_flow))
        .route("/daily-log", post(save_daily_log))
        .route("/daily-log", get(get_daily_logs))
        .with_state(state)
}

async fn log_flow(
    State(state): State<AppState>,
    Json(body): Json<NewFlow>,
) -> Result<StatusCode, ApiError> {
    ensure_editable(body.date, state.today())?;
    state.write(|engine| engine.log_flow(body.date, body.intensity))?;
    Ok(StatusCode::CREATED)
}

async fn save_daily_log(
    State(state): State<AppState>,
    Json(body): Json<NewDailyLog>,
) -> Result<(StatusCode, Json<DailyLog>), ApiError> {
    ensure_editable(body.date, state.today())?;
    let log = state.write(|engine| engine.save_daily_log(body))?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn get_daily_logs(
    State(state): State<AppState>,
    Query(query): Query<DateBody>,
) -> Result<Json<Vec<DailyLog>>, ApiError> {
    Ok(Json(state.read(|engine| engine.daily_logs_for(query.date))?))
}
