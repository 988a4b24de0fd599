//! Cycle phase and calendar state engine.
//!
//! The library derives cycle days, phases and fertility hints from a small
//! set of persisted records and exposes the mutations that change them.
//! `routes` puts an axum HTTP surface on top.

pub mod anchor;
pub mod calculator;
pub mod calendar;
pub mod config;
pub mod cycle;
pub mod date;
pub mod engine;
pub mod error;
pub mod models;
pub mod mutators;
pub mod routes;
pub mod store;

pub use engine::CycleEngine;
pub use error::{EngineError, Result};
