//! State transitions that move the cycle anchors.
//!
//! Each transition reads a snapshot and returns the `CycleWrite` that
//! replaces the keys it touches; nothing is written here. Transitions are
//! total over valid dates. An end date before the start still produces a
//! duration, clamped to one day.

use serde::Serialize;

use crate::date::CalendarDate;
use crate::models::{clamp_duration, FlowRecords, OvulationMarks, UserData};
use crate::store::{CycleSnapshot, CycleWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodState {
    NoActivePeriod,
    ActivePeriod,
}

pub fn period_state(snapshot: &CycleSnapshot) -> PeriodState {
    if snapshot.period_active() {
        PeriodState::ActivePeriod
    } else {
        PeriodState::NoActivePeriod
    }
}

fn user_data(snapshot: &CycleSnapshot) -> UserData {
    snapshot.user_data.clone().unwrap_or_default()
}

/// New period: moves the start and drops every ovulation mark, since the
/// old reference no longer describes this cycle.
pub fn mark_period_start(snapshot: &CycleSnapshot, date: CalendarDate) -> CycleWrite {
    let mut user = user_data(snapshot);
    user.period_start_date = Some(date);
    user.period_active = true;
    CycleWrite {
        user_data: Some(user),
        ovulation: Some(OvulationMarks::new()),
        ..Default::default()
    }
}

/// Returns the write together with the recorded duration in days.
pub fn mark_period_end(snapshot: &CycleSnapshot, date: CalendarDate) -> (CycleWrite, u32) {
    let mut user = user_data(snapshot);
    let start = user.period_start_date.unwrap_or(date);
    let duration = clamp_duration(date.days_since(start) + 1);
    user.period_duration = i64::from(duration);
    user.period_active = false;
    let write = CycleWrite {
        user_data: Some(user),
        ..Default::default()
    };
    (write, duration)
}

/// Throws away logged flow for a period started by mistake. The recorded
/// start and duration stay as they are.
pub fn cancel_period(snapshot: &CycleSnapshot) -> CycleWrite {
    let user_data = snapshot.user_data.clone().map(|mut user| {
        user.period_active = false;
        user
    });
    CycleWrite {
        user_data,
        flow: Some(FlowRecords::new()),
        ..Default::default()
    }
}

pub fn set_ovulation(snapshot: &CycleSnapshot, date: CalendarDate, flagged: bool) -> CycleWrite {
    let mut marks = snapshot.ovulation.clone();
    if flagged {
        marks.insert(date, true);
    } else {
        marks.remove(&date);
    }
    CycleWrite {
        ovulation: Some(marks),
        ..Default::default()
    }
}

/// Flips the mark on `date`; the flag is the state after the flip.
pub fn toggle_ovulation(snapshot: &CycleSnapshot, date: CalendarDate) -> (CycleWrite, bool) {
    let flagged = !snapshot.ovulation.get(&date).copied().unwrap_or(false);
    (set_ovulation(snapshot, date, flagged), flagged)
}
