use axum::{
    Router,
    routing::{get, post},
    extract::State,
    Json,
};
use serde::Serialize;

use super::{ensure_editable, ApiError, AppState, DateBody};
use crate::date::CalendarDate;

#[derive(Serialize)]
pub struct OvulationToggled {
    pub date: CalendarDate,
    pub marked: bool,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ovulation", post(toggle_ovulation)) // 🔁 toggle
        .route("/ovulation", get(get_ovulation_marks))
        .with_state(state)
}

async fn toggle_ovulation(
    State(state): State<AppState>,
    Json(body): Json<DateBody>,
) -> Result<Json<OvulationToggled>, ApiError> {
    ensure_editable(body.date, state.today())?;
    let marked = state.write(|engine| engine.toggle_ovulation(body.date))?;
    Ok(Json(OvulationToggled {
        date: body.date,
        marked,
    }))
}

/// Flagged dates only, oldest first.
async fn get_ovulation_marks(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarDate>>, ApiError> {
    let snapshot = state.read(|engine| engine.snapshot())?;
    let marks = snapshot
        .ovulation
        .into_iter()
        .filter_map(|(date, flagged)| flagged.then_some(date))
        .collect();
    Ok(Json(marks))
}
