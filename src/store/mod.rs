//! Persistence boundary.
//!
//! `KeyValueStore` is the raw collaborator: JSON values under a handful of
//! logical keys. `CycleStore` is what the engine sees: a typed snapshot to
//! read and a `CycleWrite` batch to commit. Every batch is applied as a unit,
//! so a snapshot taken after `commit` returns sees all of it or, on error,
//! none of it. Untrusted stored values are validated here, when the
//! snapshot is decoded, and nowhere deeper.

pub mod memory;
pub mod postgres;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::models::{CycleProfile, DailyLogs, FlowRecords, OvulationMarks, UserData};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub mod keys {
    pub const USER_DATA: &str = "userData";
    pub const FLOW_DATA: &str = "flowData";
    pub const OVULATION_DATES: &str = "ovulationDates";
    pub const CUSTOM_SYMPTOMS: &str = "customSymptoms";
    pub const ONBOARDING_COMPLETE: &str = "onboardingComplete";
    pub const DAILY_LOGS: &str = "dailyLogs";

    pub const ALL: [&str; 6] = [
        USER_DATA,
        FLOW_DATA,
        OVULATION_DATES,
        CUSTOM_SYMPTOMS,
        ONBOARDING_COMPLETE,
        DAILY_LOGS,
    ];
}

/// `None` deletes the key.
pub type Batch = Vec<(&'static str, Option<Value>)>;

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Applies every entry of `batch` or none of them.
    fn apply(&mut self, batch: Batch) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn apply(&mut self, batch: Batch) -> Result<()> {
        (**self).apply(batch)
    }
}

/// Everything the engine knows, decoded from the store in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSnapshot {
    pub user_data: Option<UserData>,
    pub flow: FlowRecords,
    pub ovulation: OvulationMarks,
    pub custom_symptoms: Vec<String>,
    pub onboarding_complete: bool,
    pub daily_logs: DailyLogs,
}

impl CycleSnapshot {
    pub fn profile(&self) -> CycleProfile {
        self.user_data
            .as_ref()
            .map(UserData::cycle_profile)
            .unwrap_or_default()
    }

    pub fn period_active(&self) -> bool {
        self.user_data.as_ref().is_some_and(|u| u.period_active)
    }
}

/// Keys a mutation replaces. Fields left `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleWrite {
    pub user_data: Option<UserData>,
    pub flow: Option<FlowRecords>,
    pub ovulation: Option<OvulationMarks>,
    pub custom_symptoms: Option<Vec<String>>,
    pub onboarding_complete: Option<bool>,
    pub daily_logs: Option<DailyLogs>,
    /// Drop every key before writing the fields above.
    pub reset: bool,
}

impl CycleWrite {
    pub fn is_empty(&self) -> bool {
        !self.reset
            && self.user_data.is_none()
            && self.flow.is_none()
            && self.ovulation.is_none()
            && self.custom_symptoms.is_none()
            && self.onboarding_complete.is_none()
            && self.daily_logs.is_none()
    }

    pub fn into_batch(self) -> Result<Batch> {
        let mut batch: Batch = Vec::new();
        if self.reset {
            batch.extend(keys::ALL.iter().map(|key| (*key, None)));
        }
        push(&mut batch, keys::USER_DATA, self.user_data)?;
        push(&mut batch, keys::FLOW_DATA, self.flow)?;
        push(&mut batch, keys::OVULATION_DATES, self.ovulation)?;
        push(&mut batch, keys::CUSTOM_SYMPTOMS, self.custom_symptoms)?;
        push(&mut batch, keys::ONBOARDING_COMPLETE, self.onboarding_complete)?;
        push(&mut batch, keys::DAILY_LOGS, self.daily_logs)?;
        Ok(batch)
    }
}

fn push<T: serde::Serialize>(batch: &mut Batch, key: &'static str, value: Option<T>) -> Result<()> {
    if let Some(value) = value {
        let json = serde_json::to_value(value).map_err(|source| EngineError::CorruptRecord { key, source })?;
        batch.push((key, Some(json)));
    }
    Ok(())
}

pub trait CycleStore {
    fn snapshot(&self) -> Result<CycleSnapshot>;

    fn commit(&mut self, write: CycleWrite) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> CycleStore for T {
    fn snapshot(&self) -> Result<CycleSnapshot> {
        Ok(CycleSnapshot {
            user_data: read(self, keys::USER_DATA)?,
            flow: read(self, keys::FLOW_DATA)?.unwrap_or_default(),
            ovulation: read(self, keys::OVULATION_DATES)?.unwrap_or_default(),
            custom_symptoms: read(self, keys::CUSTOM_SYMPTOMS)?.unwrap_or_default(),
            onboarding_complete: read_flag(self, keys::ONBOARDING_COMPLETE)?,
            daily_logs: read(self, keys::DAILY_LOGS)?.unwrap_or_default(),
        })
    }

    fn commit(&mut self, write: CycleWrite) -> Result<()> {
        if write.is_empty() {
            return Ok(());
        }
        self.apply(write.into_batch()?)
    }
}

fn read<S, T>(store: &S, key: &'static str) -> Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| EngineError::CorruptRecord { key, source }),
    }
}

// Older clients stored the flag as the string "true".
fn read_flag<S: KeyValueStore + ?Sized>(store: &S, key: &'static str) -> Result<bool> {
    match store.get(key)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(Value::String(s)) => Ok(s == "true"),
        Some(other) => serde_json::from_value(other).map_err(|source| EngineError::CorruptRecord { key, source }),
    }
}
