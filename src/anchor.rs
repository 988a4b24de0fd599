//! Picks the single reference point every cycle day is counted from.
//!
//! Precedence is fixed: the latest flagged ovulation mark (cycle day 14)
//! beats the recorded period start (cycle day 1), for every date in every
//! month. A period start recorded after that mark does not win back; marks
//! only go away through a new period start or an explicit unmark. Before
//! onboarding there is no period start at all and today stands in as day 1.

use serde::Serialize;

use crate::cycle::CycleDay;
use crate::date::CalendarDate;
use crate::models::OvulationMarks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorSource {
    OvulationMark,
    PeriodStart,
    /// Nothing recorded yet.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub reference_date: CalendarDate,
    pub reference_cycle_day: CycleDay,
    pub source: AnchorSource,
}

impl Anchor {
    pub fn period_start(date: CalendarDate) -> Self {
        Self {
            reference_date: date,
            reference_cycle_day: CycleDay::FIRST,
            source: AnchorSource::PeriodStart,
        }
    }

    pub fn ovulation(date: CalendarDate) -> Self {
        Self {
            reference_date: date,
            reference_cycle_day: CycleDay::OVULATION,
            source: AnchorSource::OvulationMark,
        }
    }
}

/// Chronologically latest mark still flagged `true`, whatever month it is in.
pub fn latest_ovulation_mark(marks: &OvulationMarks) -> Option<CalendarDate> {
    marks
        .iter()
        .rev()
        .find(|(_, flagged)| **flagged)
        .map(|(date, _)| *date)
}

pub fn resolve_anchor(
    period_start: Option<CalendarDate>,
    marks: &OvulationMarks,
    today: CalendarDate,
) -> Anchor {
    if let Some(mark) = latest_ovulation_mark(marks) {
        return Anchor::ovulation(mark);
    }
    match period_start {
        Some(start) => Anchor::period_start(start),
        None => Anchor {
            reference_date: today,
            reference_cycle_day: CycleDay::FIRST,
            source: AnchorSource::Default,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn marks(entries: &[(&str, bool)]) -> OvulationMarks {
        entries.iter().map(|(d, f)| (date(d), *f)).collect()
    }

    #[test]
    fn test_period_start_anchor_without_marks() {
        let anchor = resolve_anchor(Some(date("2025-01-15")), &OvulationMarks::new(), date("2025-06-01"));
        assert_eq!(anchor, Anchor::period_start(date("2025-01-15")));
        assert_eq!(anchor.reference_cycle_day.get(), 1);
    }

    #[test]
    fn test_latest_mark_wins_across_months() {
        let marks = marks(&[("2025-01-20", true), ("2025-03-20", true), ("2025-02-18", true)]);
        let anchor = resolve_anchor(Some(date("2025-01-01")), &marks, date("2025-01-05"));
        assert_eq!(anchor, Anchor::ovulation(date("2025-03-20")));
        assert_eq!(anchor.reference_cycle_day.get(), 14);
    }

    #[test]
    fn test_unflagged_entries_are_ignored() {
        let marks = marks(&[("2025-03-20", true), ("2025-04-17", false)]);
        assert_eq!(latest_ovulation_mark(&marks), Some(date("2025-03-20")));
        let none = self::marks(&[("2025-04-17", false)]);
        assert_eq!(latest_ovulation_mark(&none), None);
    }

    #[test]
    fn test_stale_mark_still_beats_newer_period_start() {
        let marks = marks(&[("2025-01-14", true)]);
        let anchor = resolve_anchor(Some(date("2025-05-01")), &marks, date("2025-05-02"));
        assert_eq!(anchor.source, AnchorSource::OvulationMark);
        assert_eq!(anchor.reference_date, date("2025-01-14"));
    }

    #[test]
    fn test_missing_anchor_defaults_to_today() {
        let today = date("2025-07-09");
        let anchor = resolve_anchor(None, &OvulationMarks::new(), today);
        assert_eq!(anchor.source, AnchorSource::Default);
        assert_eq!(anchor.reference_date, today);
        assert_eq!(anchor.reference_cycle_day, CycleDay::FIRST);
    }
}
