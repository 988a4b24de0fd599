use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::calendar::CalendarMonth;
use crate::cycle::{PhaseInfo, CYCLE_PHASES};
use crate::date::{Locale, YearMonth};

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    /// Zero-based.
    pub month: u32,
    pub locale: Option<Locale>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/calendar", get(get_calendar_month))
        .route("/phases", get(get_phases))
        .with_state(state)
}

async fn get_calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarMonth>, ApiError> {
    let month = YearMonth::new(query.year, query.month).map_err(super::api_error)?;
    let today = state.today();
    let calendar = state.read(|engine| {
        let locale = query.locale.unwrap_or(engine.locale());
        engine.annotate_month_in(month, today, locale)
    })?;
    Ok(Json(calendar))
}

async fn get_phases() -> Json<&'static [PhaseInfo]> {
    Json(&CYCLE_PHASES[..])
}
