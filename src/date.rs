//! Date-only values and month-grid arithmetic.
//!
//! Every date the engine touches is a `CalendarDate`: a local calendar day
//! without time of day or timezone. Persisted keys and API payloads use the
//! canonical `YYYY-MM-DD` form produced by its `Display` impl, and nothing
//! else in the crate formats or parses dates by hand.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Today's date in the local calendar, time of day dropped.
    pub fn today_local() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    pub fn add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    /// Whole calendar days from `earlier` to `self`; negative when `self`
    /// comes first.
    pub fn days_since(self, earlier: CalendarDate) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidDate {
            value: s.to_string(),
        };
        // chrono accepts single-digit fields; keys must stay canonical
        if s.len() != 10 {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(s, CANONICAL_FORMAT)
            .map(Self)
            .map_err(|_| invalid())
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

/// A displayed month. The month index is zero-based (January = 0), the way
/// the calendar screen and its query parameters count months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if month > 11 {
            return Err(EngineError::InvalidMonth(month));
        }
        NaiveDate::from_ymd_opt(year, month + 1, 1)
            .map(|first| Self { first })
            .ok_or_else(|| EngineError::InvalidInput(format!("year {year} is out of range")))
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month0()
    }

    /// The `day`-th (1-based) day of this month, if it exists.
    pub fn date(&self, day: u32) -> Option<CalendarDate> {
        self.first.with_day(day).map(CalendarDate)
    }

    pub fn dates(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        (1..=days_in_month(*self)).filter_map(|day| self.date(day))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

impl FromStr for Locale {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            other => Err(EngineError::InvalidInput(format!("unsupported locale '{other}'"))),
        }
    }
}

const MONTH_NAMES_DE: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September", "Oktober",
    "November", "Dezember",
];

const MONTH_NAMES_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS_DE: [&str; 7] = ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"];
const WEEKDAYS_EN: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Length of the month, taken from the day before the next month's 1st.
pub fn days_in_month(month: YearMonth) -> u32 {
    let (year, next) = match month.first.month() {
        12 => (month.year() + 1, 1),
        m => (month.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, next, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// ISO weekday of the 1st: Monday = 1 .. Sunday = 7.
pub fn first_weekday_of_month(month: YearMonth) -> u32 {
    month.first.weekday().number_from_monday()
}

pub fn month_name(month: YearMonth, locale: Locale) -> &'static str {
    let names = match locale {
        Locale::De => &MONTH_NAMES_DE,
        Locale::En => &MONTH_NAMES_EN,
    };
    names[month.month() as usize]
}

/// Column headers for a Monday-first 7-column grid.
pub fn weekday_labels(locale: Locale) -> [&'static str; 7] {
    match locale {
        Locale::De => WEEKDAYS_DE,
        Locale::En => WEEKDAYS_EN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_canonical_round_trip() {
        let d = date("2025-01-05");
        assert_eq!(d.to_string(), "2025-01-05");
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2025-01-05\"");
        let back: CalendarDate = serde_json::from_str("\"2025-01-05\"").unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_rejects_non_canonical_strings() {
        for bad in ["2025-1-5", "2025-01-05T00:00:00Z", "05.01.2025", "", "2025-02-30"] {
            let err = bad.parse::<CalendarDate>().unwrap_err();
            assert!(matches!(err, EngineError::InvalidDate { .. }), "{bad}");
        }
    }

    #[test]
    fn test_works_as_json_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(date("2025-03-20"), 3u8);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2025-03-20":3}"#);
        let back: std::collections::BTreeMap<CalendarDate, u8> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_days_since_across_boundaries() {
        assert_eq!(date("2025-01-01").days_since(date("2024-12-31")), 1);
        assert_eq!(date("2024-03-01").days_since(date("2024-02-28")), 2);
        assert_eq!(date("2025-03-01").days_since(date("2025-02-28")), 1);
        assert_eq!(date("2025-01-10").days_since(date("2025-01-15")), -5);
    }

    #[test]
    fn test_days_since_around_dst_changes() {
        // EU and US spring-forward / fall-back weekends
        assert_eq!(date("2025-03-31").days_since(date("2025-03-30")), 1);
        assert_eq!(date("2025-03-30").days_since(date("2025-03-29")), 1);
        assert_eq!(date("2025-03-10").days_since(date("2025-03-09")), 1);
        assert_eq!(date("2025-10-27").days_since(date("2025-10-25")), 2);
        assert_eq!(date("2025-11-03").days_since(date("2025-11-01")), 2);
    }

    #[test]
    fn test_add_days() {
        assert_eq!(date("2024-12-30").add_days(3), Some(date("2025-01-02")));
        assert_eq!(date("2025-03-01").add_days(-1), Some(date("2025-02-28")));
    }

    #[test]
    fn test_year_month_validation() {
        assert!(YearMonth::new(2025, 0).is_ok());
        assert!(YearMonth::new(2025, 11).is_ok());
        assert!(matches!(YearMonth::new(2025, 12), Err(EngineError::InvalidMonth(12))));
    }

    #[test]
    fn test_days_in_month() {
        let ym = |y, m| YearMonth::new(y, m).unwrap();
        assert_eq!(days_in_month(ym(2025, 0)), 31);
        assert_eq!(days_in_month(ym(2025, 1)), 28);
        assert_eq!(days_in_month(ym(2024, 1)), 29);
        assert_eq!(days_in_month(ym(1900, 1)), 28);
        assert_eq!(days_in_month(ym(2000, 1)), 29);
        assert_eq!(days_in_month(ym(2025, 3)), 30);
        assert_eq!(days_in_month(ym(2025, 11)), 31);
        assert_eq!(days_in_month(ym(2025, 10)), 30);
    }

    #[test]
    fn test_first_weekday_is_iso() {
        // 2025-09-01 is a Monday, 2025-06-01 a Sunday
        assert_eq!(first_weekday_of_month(YearMonth::new(2025, 8).unwrap()), 1);
        assert_eq!(first_weekday_of_month(YearMonth::new(2025, 5).unwrap()), 7);
        // 2025-01-01 is a Wednesday
        assert_eq!(first_weekday_of_month(YearMonth::new(2025, 0).unwrap()), 3);
    }

    #[test]
    fn test_month_names() {
        let march = YearMonth::new(2025, 2).unwrap();
        assert_eq!(month_name(march, Locale::De), "März");
        assert_eq!(month_name(march, Locale::En), "March");
    }

    #[test]
    fn test_dates_cover_whole_month() {
        let feb = YearMonth::new(2024, 1).unwrap();
        let dates: Vec<_> = feb.dates().collect();
        assert_eq!(dates.len(), 29);
        assert_eq!(dates[0], date("2024-02-01"));
        assert_eq!(dates[28], date("2024-02-29"));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }
}
