use axum::{
    Router,
    routing::{get, post, delete},
    extract::State,
    Json,
};
use serde::Deserialize;

use super::{ApiError, AppState};

#[derive(Deserialize)]
pub struct SymptomBody {
    pub symptom: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/symptoms/custom", get(get_custom_symptoms))
        .route("/symptoms/custom", post(add_custom_symptom))
        .route("/symptoms/custom", delete(remove_custom_symptom))
        .with_state(state)
}

async fn get_custom_symptoms(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.read(|engine| engine.custom_symptoms())?))
}

async fn add_custom_symptom(
    State(state): State<AppState>,
    Json(body): Json<SymptomBody>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.write(|engine| engine.add_custom_symptom(&body.symptom))?))
}

/// Removing an unknown symptom is not an error; the list comes back as is.
async fn remove_custom_symptom(
    State(state): State<AppState>,
    Json(body): Json<SymptomBody>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.write(|engine| engine.remove_custom_symptom(&body.symptom))?))
}
