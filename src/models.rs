use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::date::CalendarDate;
use crate::error::{EngineError, Result};

pub const DEFAULT_PERIOD_DURATION: u32 = 5;

/// Date → "this was an ovulation day". Only `true` entries count as marks.
pub type OvulationMarks = BTreeMap<CalendarDate, bool>;

pub type FlowRecords = BTreeMap<CalendarDate, FlowIntensity>;

pub type DailyLogs = BTreeMap<CalendarDate, Vec<DailyLog>>;

/// Reported flow strength, 1 (spotting) to 5 (very heavy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FlowIntensity(u8);

impl FlowIntensity {
    pub fn new(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidFlowIntensity(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for FlowIntensity {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FlowIntensity> for u8 {
    fn from(value: FlowIntensity) -> Self {
        value.0
    }
}

/// Self-reported mood, 1 to 5. Stored logs outside that range fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
    pub fn new(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidMood(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Mood {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Mood> for u8 {
    fn from(value: Mood) -> Self {
        value.0
    }
}

/// The `userData` record written at onboarding. Numeric fields are read
/// leniently because older records stored form input verbatim ("", "170").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub birthdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_number")]
    pub age: Option<f64>,
    /// Centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_number")]
    pub height: Option<f64>,
    /// Kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_number")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_date")]
    pub period_start_date: Option<CalendarDate>,
    #[serde(default = "default_duration", deserialize_with = "lenient::duration")]
    pub period_duration: i64,
    #[serde(default, rename = "hideBMI")]
    pub hide_bmi: bool,
    #[serde(default)]
    pub period_active: bool,
}

fn default_duration() -> i64 {
    i64::from(DEFAULT_PERIOD_DURATION)
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            name: String::new(),
            birthdate: None,
            age: None,
            height: None,
            weight: None,
            motivations: Vec::new(),
            period_start_date: None,
            period_duration: default_duration(),
            hide_bmi: false,
            period_active: false,
        }
    }
}

impl UserData {
    pub fn cycle_profile(&self) -> CycleProfile {
        CycleProfile {
            period_start_date: self.period_start_date,
            period_duration: clamp_duration(self.period_duration),
        }
    }

    /// Body-mass index rounded to one decimal, unless hidden or incomplete.
    pub fn bmi(&self) -> Option<f64> {
        if self.hide_bmi {
            return None;
        }
        let height_m = self.height.filter(|h| *h > 0.0)? / 100.0;
        let weight = self.weight.filter(|w| *w > 0.0)?;
        let bmi = weight / (height_m * height_m);
        Some((bmi * 10.0).round() / 10.0)
    }
}

/// The two fields of `userData` that drive cycle derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleProfile {
    pub period_start_date: Option<CalendarDate>,
    /// Always at least 1.
    pub period_duration: u32,
}

impl Default for CycleProfile {
    fn default() -> Self {
        Self {
            period_start_date: None,
            period_duration: DEFAULT_PERIOD_DURATION,
        }
    }
}

pub fn clamp_duration(days: i64) -> u32 {
    if days < 1 {
        tracing::warn!("⚠️ period duration {} clamped to 1", days);
        1
    } else {
        u32::try_from(days).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub date: CalendarDate,
    pub mood: Mood,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_intensity: Option<FlowIntensity>,
}

/// A daily log as submitted, before it gets an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDailyLog {
    pub date: CalendarDate,
    pub mood: u8,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub flow_intensity: Option<u8>,
}

impl NewDailyLog {
    pub fn into_log(self) -> Result<DailyLog> {
        let mood = Mood::new(self.mood)?;
        let flow_intensity = self.flow_intensity.map(FlowIntensity::new).transpose()?;
        let symptoms = self
            .symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(DailyLog {
            id: Uuid::new_v4(),
            date: self.date,
            mood,
            symptoms,
            weight: self.weight,
            temperature: self.temperature,
            flow_intensity,
        })
    }
}

/// Profile edits; fields left out keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub motivations: Option<Vec<String>>,
    pub period_duration: Option<i64>,
    #[serde(rename = "hideBMI")]
    pub hide_bmi: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut UserData) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(birthdate) = self.birthdate {
            user.birthdate = Some(birthdate);
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(height) = self.height {
            user.height = Some(height);
        }
        if let Some(weight) = self.weight {
            user.weight = Some(weight);
        }
        if let Some(motivations) = self.motivations {
            user.motivations = motivations;
        }
        if let Some(duration) = self.period_duration {
            user.period_duration = i64::from(clamp_duration(duration));
        }
        if let Some(hide_bmi) = self.hide_bmi {
            user.hide_bmi = hide_bmi;
        }
    }
}

mod lenient {
    use super::*;
    use serde_json::Value;

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.filter(|s| !s.trim().is_empty()))
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .replace(',', ".")
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("'{s}' is not a number"))),
            Some(other) => Err(de::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<CalendarDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => s.parse().map(Some).map_err(de::Error::custom),
        }
    }

    pub fn duration<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(default_duration()),
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| de::Error::custom(format!("period duration {n} is not an integer"))),
            Value::String(s) if s.trim().is_empty() => Ok(default_duration()),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("period duration '{s}' is not an integer"))),
            other => Err(de::Error::custom(format!("expected a period duration, got {other}"))),
        }
    }
}
