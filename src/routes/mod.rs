pub mod calendar;
pub mod cycle;
pub mod ovulation;
pub mod profile;
pub mod symptoms;
pub mod tracking;

use std::sync::{Arc, Mutex, PoisonError};

use axum::{http::StatusCode, routing::get, Router};
use serde::Deserialize;

use crate::date::{CalendarDate, Locale};
use crate::engine::CycleEngine;
use crate::error::EngineError;
use crate::store::KeyValueStore;

pub type Engine = CycleEngine<Box<dyn KeyValueStore>>;

pub type ApiError = (StatusCode, String);

/// Where "today" comes from. Tests pin it.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    Local,
    Fixed(CalendarDate),
}

impl Clock {
    pub fn today(&self) -> CalendarDate {
        match self {
            Self::Local => CalendarDate::today_local(),
            Self::Fixed(date) => *date,
        }
    }
}

/// Shared handler state. The engine is synchronous; the lock is taken and
/// released inside `read`/`write` and never held across an `.await`.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<Engine>>,
    clock: Clock,
}

impl AppState {
    pub fn new(store: Box<dyn KeyValueStore>, locale: Locale) -> Self {
        Self {
            engine: Arc::new(Mutex::new(CycleEngine::new(store).with_locale(locale))),
            clock: Clock::Local,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> CalendarDate {
        self.clock.today()
    }

    pub fn read<T>(&self, f: impl FnOnce(&Engine) -> crate::Result<T>) -> Result<T, ApiError> {
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&engine).map_err(api_error)
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut Engine) -> crate::Result<T>) -> Result<T, ApiError> {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut engine).map_err(api_error)
    }
}

pub fn api_error(e: EngineError) -> ApiError {
    if e.is_invalid_input() {
        tracing::info!("ℹ️ Rejected request: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("❌ Engine error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Stored data could not be processed".into())
    }
}

/// Only today's tile may be changed; past and future days are read-only.
pub fn ensure_editable(date: CalendarDate, today: CalendarDate) -> Result<(), ApiError> {
    if date == today {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            format!("{date} is read-only, only {today} can be edited"),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct DateBody {
    pub date: CalendarDate,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(calendar::routes(state.clone()))
        .merge(cycle::routes(state.clone()))
        .merge(ovulation::routes(state.clone()))
        .merge(tracking::routes(state.clone()))
        .merge(symptoms::routes(state.clone()))
        .merge(profile::routes(state))
        .route("/health", get(|| async { "✅ Backend up" }))
}
