//! Per-day view models for a displayed month.
//!
//! Two different notions of "ovulation" meet here. Cycle days are counted
//! from the single latest mark (see `anchor`), so the month reads as one
//! consistent timeline. The fertile window instead looks at the nearest of
//! *all* flagged marks, so every day the user marked gets its own halo.
//! The two are not unified.

use serde::Serialize;

use crate::anchor::{resolve_anchor, Anchor, AnchorSource};
use crate::calculator::{cycle_day_for, days_until_next_period, is_period_day};
use crate::cycle::{phase_for_cycle_day, CycleDay, Phase};
use crate::date::{first_weekday_of_month, month_name, weekday_labels, CalendarDate, Locale, YearMonth};
use crate::models::{CycleProfile, FlowRecords, OvulationMarks};
use crate::store::CycleSnapshot;

/// Period-day colors by flow intensity 1..=5, lightest to darkest.
pub const FLOW_PALETTE: [&str; 5] = ["#F5D5C0", "#EDC3A9", "#E6B89C", "#D4967A", "#B8735A"];

/// Fertility intensity by distance in days from the ovulation reference.
/// Anything further away is 0.
const FERTILITY_STEPS: [f64; 4] = [1.0, 0.8, 0.6, 0.4];

/// Window used when the user has not marked any ovulation.
const APPROXIMATE_FERTILE_DAYS: std::ops::RangeInclusive<u8> = 10..=16;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDayView {
    pub date: CalendarDate,
    pub day: u32,
    pub cycle_day: CycleDay,
    pub phase: Phase,
    pub color: &'static str,
    pub is_today: bool,
    pub is_past: bool,
    pub is_future: bool,
    pub is_period_day: bool,
    /// 0 when nothing was logged.
    pub flow_intensity: u8,
    pub is_fertile: bool,
    pub fertility_intensity: f64,
    pub is_ovulation_day: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    /// Zero-based.
    pub month: u32,
    pub month_name: &'static str,
    pub weekday_labels: [&'static str; 7],
    /// ISO weekday of the 1st, Monday = 1.
    pub first_weekday: u32,
    pub anchor: Anchor,
    /// Leading `None`s pad the first week of a Monday-first grid.
    pub days: Vec<Option<CalendarDayView>>,
}

/// The inputs shared by every day of one query.
pub struct DayContext<'a> {
    pub anchor: Anchor,
    pub profile: CycleProfile,
    pub marks: &'a OvulationMarks,
    pub flow: &'a FlowRecords,
    pub today: CalendarDate,
}

impl<'a> DayContext<'a> {
    pub fn new(snapshot: &'a CycleSnapshot, today: CalendarDate) -> Self {
        let profile = snapshot.profile();
        Self {
            anchor: resolve_anchor(profile.period_start_date, &snapshot.ovulation, today),
            profile,
            marks: &snapshot.ovulation,
            flow: &snapshot.flow,
            today,
        }
    }

    pub fn annotate(&self, date: CalendarDate) -> CalendarDayView {
        let cycle_day = cycle_day_for(date, &self.anchor);
        let phase = phase_for_cycle_day(cycle_day).info();
        let is_period_day = is_period_day(cycle_day, self.profile.period_duration);
        let flow_intensity = self.flow.get(&date).map_or(0, |f| f.get());

        let color = if is_period_day && flow_intensity > 0 {
            FLOW_PALETTE[usize::from(flow_intensity - 1)]
        } else {
            phase.color
        };

        let has_marks = self.marks.values().any(|flagged| *flagged);
        let (is_fertile, fertility_intensity) = if has_marks {
            let intensity = nearest_mark_distance(date, self.marks).map_or(0.0, fertility_at);
            (intensity > 0.0, intensity)
        } else {
            // the approximated window is fertile end to end, even where the
            // decay has already reached 0
            let distance = cycle_day.get().abs_diff(CycleDay::OVULATION.get());
            (
                APPROXIMATE_FERTILE_DAYS.contains(&cycle_day.get()),
                fertility_at(i64::from(distance)),
            )
        };
        let is_ovulation_day = if has_marks {
            self.marks.get(&date).copied().unwrap_or(false)
        } else {
            cycle_day == CycleDay::OVULATION
        };

        let is_today = date == self.today;
        CalendarDayView {
            date,
            day: date.day(),
            cycle_day,
            phase: phase.phase,
            color,
            is_today,
            is_past: date < self.today,
            is_future: date > self.today,
            is_period_day,
            flow_intensity,
            is_fertile,
            fertility_intensity,
            is_ovulation_day,
            editable: is_today,
        }
    }
}

/// Distance in days to the closest flagged mark, if any.
pub fn nearest_mark_distance(date: CalendarDate, marks: &OvulationMarks) -> Option<i64> {
    marks
        .iter()
        .filter(|(_, flagged)| **flagged)
        .map(|(mark, _)| date.days_since(*mark).abs())
        .min()
}

fn fertility_at(distance: i64) -> f64 {
    usize::try_from(distance)
        .ok()
        .and_then(|d| FERTILITY_STEPS.get(d).copied())
        .unwrap_or(0.0)
}

pub fn annotate_month(
    month: YearMonth,
    snapshot: &CycleSnapshot,
    today: CalendarDate,
    locale: Locale,
) -> CalendarMonth {
    let context = DayContext::new(snapshot, today);
    let first_weekday = first_weekday_of_month(month);

    tracing::debug!(
        "🗓️ Annotating {}-{:02} from {:?} anchor {}",
        month.year(),
        month.month() + 1,
        context.anchor.source,
        context.anchor.reference_date
    );

    let padding = (first_weekday - 1) as usize;
    let mut days = Vec::with_capacity(padding + 31);
    days.resize(padding, None);
    days.extend(month.dates().map(|date| Some(context.annotate(date))));

    CalendarMonth {
        year: month.year(),
        month: month.month(),
        month_name: month_name(month, locale),
        weekday_labels: weekday_labels(locale),
        first_weekday,
        anchor: context.anchor,
        days,
    }
}

/// Home-screen status for a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub date: CalendarDate,
    pub cycle_day: CycleDay,
    pub phase: Phase,
    pub phase_emoji: &'static str,
    pub is_period_day: bool,
    pub in_fertile_window: bool,
    pub fertility_intensity: f64,
    pub period_expected_in_days: u8,
    pub period_active: bool,
    pub period_start_date: Option<CalendarDate>,
    pub period_duration: u32,
    pub anchor_source: AnchorSource,
}

pub fn summarize(snapshot: &CycleSnapshot, today: CalendarDate) -> CycleSummary {
    let context = DayContext::new(snapshot, today);
    let view = context.annotate(today);
    CycleSummary {
        date: today,
        cycle_day: view.cycle_day,
        phase: view.phase,
        phase_emoji: view.phase.info().emoji,
        is_period_day: view.is_period_day,
        in_fertile_window: view.is_fertile,
        fertility_intensity: view.fertility_intensity,
        period_expected_in_days: days_until_next_period(view.cycle_day),
        period_active: snapshot.period_active(),
        period_start_date: context.profile.period_start_date,
        period_duration: context.profile.period_duration,
        anchor_source: context.anchor.source,
    }
}
