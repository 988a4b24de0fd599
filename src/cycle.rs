//! The idealized 28-day cycle: cycle days, phases and their display metadata.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

pub const CYCLE_LENGTH: u8 = 28;

/// A position within the idealized cycle, always in `1..=28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CycleDay(u8);

impl CycleDay {
    pub const FIRST: CycleDay = CycleDay(1);
    pub const OVULATION: CycleDay = CycleDay(14);

    pub fn new(day: u8) -> Option<Self> {
        (1..=CYCLE_LENGTH).contains(&day).then_some(Self(day))
    }

    /// Folds any signed day number onto `1..=28` with 1-indexed modulo, so
    /// 0 becomes 28, -1 becomes 27 and 29 becomes 1.
    pub fn wrapping(raw: i64) -> Self {
        let len = i64::from(CYCLE_LENGTH);
        let mut raw = raw;
        if raw <= 0 {
            raw += len * ((-raw) / len + 1);
        }
        let day = (raw - 1).rem_euclid(len) + 1;
        Self(day as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CycleDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn key(self) -> &'static str {
        match self {
            Self::Menstruation => "menstruation",
            Self::Follicular => "follicular",
            Self::Ovulation => "ovulation",
            Self::Luteal => "luteal",
        }
    }

    pub fn info(self) -> &'static PhaseInfo {
        match self {
            Self::Menstruation => &CYCLE_PHASES[0],
            Self::Follicular => &CYCLE_PHASES[1],
            Self::Ovulation => &CYCLE_PHASES[2],
            Self::Luteal => &CYCLE_PHASES[3],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInfo {
    pub phase: Phase,
    pub first_day: u8,
    pub last_day: u8,
    pub color: &'static str,
    pub gradient: &'static str,
    pub emoji: &'static str,
    pub name_key: &'static str,
    pub info_key: &'static str,
}

impl PhaseInfo {
    pub fn days(&self) -> RangeInclusive<u8> {
        self.first_day..=self.last_day
    }

    pub fn contains(&self, day: CycleDay) -> bool {
        self.days().contains(&day.get())
    }
}

pub static CYCLE_PHASES: [PhaseInfo; 4] = [
    PhaseInfo {
        phase: Phase::Menstruation,
        first_day: 1,
        last_day: 5,
        color: "#E6B89C",
        gradient: "linear-gradient(135deg, #E6B89C 0%, #F5D5C0 100%)",
        emoji: "🌙",
        name_key: "phases.menstruation.name",
        info_key: "phases.menstruation.info",
    },
    PhaseInfo {
        phase: Phase::Follicular,
        first_day: 6,
        last_day: 13,
        color: "#B8E6D5",
        gradient: "linear-gradient(135deg, #B8E6D5 0%, #D4F1E8 100%)",
        emoji: "🌱",
        name_key: "phases.follicular.name",
        info_key: "phases.follicular.info",
    },
    PhaseInfo {
        phase: Phase::Ovulation,
        first_day: 14,
        last_day: 14,
        color: "#F5C2C7",
        gradient: "linear-gradient(135deg, #F5C2C7 0%, #FFE0E5 100%)",
        emoji: "🌸",
        name_key: "phases.ovulation.name",
        info_key: "phases.ovulation.info",
    },
    PhaseInfo {
        phase: Phase::Luteal,
        first_day: 15,
        last_day: 28,
        color: "#F9E4B7",
        gradient: "linear-gradient(135deg, #F9E4B7 0%, #FFF4D6 100%)",
        emoji: "🍂",
        name_key: "phases.luteal.name",
        info_key: "phases.luteal.info",
    },
];

/// Result of a phase lookup. `Fallback` means no range matched, which the
/// `CycleDay` invariant rules out; it is kept as a tagged variant so callers
/// and tests can tell it apart from a genuine menstruation day.
#[derive(Debug, Clone, Copy)]
pub enum PhaseLookup {
    Matched(&'static PhaseInfo),
    Fallback(&'static PhaseInfo),
}

impl PhaseLookup {
    pub fn info(self) -> &'static PhaseInfo {
        match self {
            Self::Matched(info) | Self::Fallback(info) => info,
        }
    }

    pub fn phase(self) -> Phase {
        self.info().phase
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

pub fn phase_for_cycle_day(day: CycleDay) -> PhaseLookup {
    lookup_raw(day.get())
}

fn lookup_raw(day: u8) -> PhaseLookup {
    match CYCLE_PHASES.iter().find(|info| info.days().contains(&day)) {
        Some(info) => PhaseLookup::Matched(info),
        None => {
            tracing::warn!("⚠️ no phase covers cycle day {}, falling back to menstruation", day);
            PhaseLookup::Fallback(&CYCLE_PHASES[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cycle_day_resolves_without_fallback() {
        for day in 1..=CYCLE_LENGTH {
            let lookup = phase_for_cycle_day(CycleDay::new(day).unwrap());
            assert!(!lookup.is_fallback(), "day {day} fell back");
        }
    }

    #[test]
    fn test_phase_ranges_partition_the_cycle() {
        for day in 1..=CYCLE_LENGTH {
            let owners = CYCLE_PHASES.iter().filter(|p| p.days().contains(&day)).count();
            assert_eq!(owners, 1, "day {day} is covered {owners} times");
        }
        let covered: usize = CYCLE_PHASES.iter().map(|p| p.days().count()).sum();
        assert_eq!(covered, CYCLE_LENGTH as usize);
    }

    #[test]
    fn test_phase_boundaries() {
        let phase = |d| phase_for_cycle_day(CycleDay::new(d).unwrap()).phase();
        assert_eq!(phase(1), Phase::Menstruation);
        assert_eq!(phase(5), Phase::Menstruation);
        assert_eq!(phase(6), Phase::Follicular);
        assert_eq!(phase(13), Phase::Follicular);
        assert_eq!(phase(14), Phase::Ovulation);
        assert_eq!(phase(15), Phase::Luteal);
        assert_eq!(phase(28), Phase::Luteal);
    }

    #[test]
    fn test_out_of_range_lookup_is_tagged_fallback() {
        for raw in [0u8, 29, 200] {
            let lookup = lookup_raw(raw);
            assert!(lookup.is_fallback());
            assert_eq!(lookup.phase(), Phase::Menstruation);
        }
    }

    #[test]
    fn test_cycle_day_bounds() {
        assert!(CycleDay::new(0).is_none());
        assert!(CycleDay::new(29).is_none());
        assert_eq!(CycleDay::new(28).map(CycleDay::get), Some(28));
    }

    #[test]
    fn test_wrapping() {
        assert_eq!(CycleDay::wrapping(1).get(), 1);
        assert_eq!(CycleDay::wrapping(28).get(), 28);
        assert_eq!(CycleDay::wrapping(29).get(), 1);
        assert_eq!(CycleDay::wrapping(0).get(), 28);
        assert_eq!(CycleDay::wrapping(-4).get(), 24);
        assert_eq!(CycleDay::wrapping(-27).get(), 1);
        assert_eq!(CycleDay::wrapping(-28).get(), 28);
        assert_eq!(CycleDay::wrapping(-1000).get(), CycleDay::wrapping(-1000 + 28 * 40).get());
    }

    #[test]
    fn test_phase_info_lookup_by_tag() {
        for info in &CYCLE_PHASES {
            assert_eq!(info.phase.info().phase, info.phase);
            assert!(info.name_key.contains(info.phase.key()));
        }
    }
}
