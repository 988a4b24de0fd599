use crate::anchor::Anchor;
use crate::cycle::{CycleDay, CYCLE_LENGTH};
use crate::date::CalendarDate;

/// Cycle day of `date`, counted in whole calendar days from the anchor and
/// folded onto `1..=28`. Dates before the anchor wrap into the tail of the
/// previous idealized cycle.
pub fn cycle_day_for(date: CalendarDate, anchor: &Anchor) -> CycleDay {
    let offset = date.days_since(anchor.reference_date);
    CycleDay::wrapping(i64::from(anchor.reference_cycle_day.get()) + offset)
}

pub fn is_period_day(day: CycleDay, period_duration: u32) -> bool {
    u32::from(day.get()) <= period_duration.max(1)
}

/// Days until cycle day 1 comes around again; 28 on day 1 itself.
pub fn days_until_next_period(day: CycleDay) -> u8 {
    CYCLE_LENGTH + 1 - day.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::resolve_anchor;
    use crate::models::OvulationMarks;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn period_anchor(s: &str) -> Anchor {
        Anchor::period_start(date(s))
    }

    #[test]
    fn test_anchor_date_yields_reference_day() {
        assert_eq!(cycle_day_for(date("2025-01-15"), &period_anchor("2025-01-15")).get(), 1);
        let ovulation = Anchor::ovulation(date("2025-03-20"));
        assert_eq!(cycle_day_for(date("2025-03-20"), &ovulation).get(), 14);
    }

    #[test]
    fn test_wraps_before_period_start() {
        let anchor = period_anchor("2025-01-15");
        assert_eq!(cycle_day_for(date("2025-01-10"), &anchor).get(), 24);
        assert_eq!(cycle_day_for(date("2025-01-14"), &anchor).get(), 28);
        assert_eq!(cycle_day_for(date("2024-12-18"), &anchor).get(), 1);
        // 594 days back
        assert_eq!(cycle_day_for(date("2023-06-01"), &anchor).get(), 23);
    }

    #[test]
    fn test_wraps_after_period_start() {
        let anchor = period_anchor("2025-01-15");
        assert_eq!(cycle_day_for(date("2025-02-11"), &anchor).get(), 28);
        assert_eq!(cycle_day_for(date("2025-02-12"), &anchor).get(), 1);
        assert_eq!(cycle_day_for(date("2025-02-26"), &anchor).get(), 15);
    }

    #[test]
    fn test_ovulation_anchor_neighbours() {
        let mut marks = OvulationMarks::new();
        marks.insert(date("2025-03-20"), true);
        let anchor = resolve_anchor(Some(date("2025-01-15")), &marks, date("2025-03-20"));
        assert_eq!(cycle_day_for(date("2025-03-20"), &anchor).get(), 14);
        assert_eq!(cycle_day_for(date("2025-03-21"), &anchor).get(), 15);
        assert_eq!(cycle_day_for(date("2025-03-19"), &anchor).get(), 13);
        assert_eq!(cycle_day_for(date("2025-03-07"), &anchor).get(), 1);
        assert_eq!(cycle_day_for(date("2025-03-06"), &anchor).get(), 28);
    }

    #[test]
    fn test_output_always_in_range() {
        let anchor = period_anchor("2024-02-29");
        let start = date("2022-01-01");
        for offset in 0..(365 * 5) {
            let day = cycle_day_for(start.add_days(offset).unwrap(), &anchor).get();
            assert!((1..=28).contains(&day));
        }
    }

    #[test]
    fn test_counts_calendar_days_over_dst_weekends() {
        let anchor = period_anchor("2025-03-29");
        assert_eq!(cycle_day_for(date("2025-03-30"), &anchor).get(), 2);
        assert_eq!(cycle_day_for(date("2025-03-31"), &anchor).get(), 3);
        let autumn = period_anchor("2025-10-25");
        assert_eq!(cycle_day_for(date("2025-10-27"), &autumn).get(), 3);
    }

    #[test]
    fn test_pure_regardless_of_call_order() {
        let anchor = period_anchor("2025-01-15");
        let later = cycle_day_for(date("2025-05-05"), &anchor);
        let _ = cycle_day_for(date("2020-01-01"), &anchor);
        assert_eq!(cycle_day_for(date("2025-05-05"), &anchor), later);
    }

    #[test]
    fn test_period_day_uses_clamped_duration() {
        let day = |d| CycleDay::new(d).unwrap();
        assert!(is_period_day(day(1), 5));
        assert!(is_period_day(day(5), 5));
        assert!(!is_period_day(day(6), 5));
        assert!(is_period_day(day(1), 0));
        assert!(!is_period_day(day(2), 0));
    }

    #[test]
    fn test_days_until_next_period() {
        assert_eq!(days_until_next_period(CycleDay::new(1).unwrap()), 28);
        assert_eq!(days_until_next_period(CycleDay::new(28).unwrap()), 1);
    }
}
