use axum::{
    Router,
    routing::{get, post},
    extract::State,
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::models::{ProfileUpdate, UserData};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub onboarding_complete: bool,
    pub user_data: Option<UserData>,
    /// Left out when the user hides it or height/weight are missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Onboarding {
    pub user_data: UserData,
    #[serde(default)]
    pub custom_symptoms: Vec<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/onboarding", post(complete_onboarding))
        .route("/reset", post(reset))
        .with_state(state)
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    let snapshot = state.read(|engine| engine.snapshot())?;
    let bmi = snapshot.user_data.as_ref().and_then(UserData::bmi);
    Ok(Json(Profile {
        onboarding_complete: snapshot.onboarding_complete,
        user_data: snapshot.user_data,
        bmi,
    }))
}

async fn update_profile(
    State(state): State<AppState>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<UserData>, ApiError> {
    Ok(Json(state.write(|engine| engine.update_profile(body))?))
}

async fn complete_onboarding(
    State(state): State<AppState>,
    Json(body): Json<Onboarding>,
) -> Result<StatusCode, ApiError> {
    state.write(|engine| engine.complete_onboarding(body.user_data, body.custom_symptoms))?;
    Ok(StatusCode::CREATED)
}

async fn reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.write(|engine| engine.reset())?;
    Ok(StatusCode::NO_CONTENT)
}
