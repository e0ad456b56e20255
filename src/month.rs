use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    /// Whole months from `self` to `later`; negative when `later` is earlier.
    pub fn months_until(&self, later: YearMonth) -> i64 {
        later.ordinal() - self.ordinal()
    }

    pub fn add_months(&self, delta: i64) -> Self {
        Self::from_ordinal(self.ordinal() + delta)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let malformed = || Error::Parse(format!("expected YYYY-MM, got {value:?}"));

        let (year, month) = value.split_once('-').ok_or_else(malformed)?;
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month).map_err(|_| malformed())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(value: &str) -> YearMonth {
        value.parse().unwrap()
    }

    #[test]
    fn parses_well_formed_months() {
        let parsed = ym("2026-03");
        assert_eq!(parsed.year(), 2026);
        assert_eq!(parsed.month(), 3);
        assert_eq!(parsed.to_string(), "2026-03");
    }

    #[test]
    fn rejects_malformed_months() {
        for bad in ["", "2026", "2026-3", "2026-13", "2026-00", "26-03", "2026/03", "2026-03-01", " 2026-03", "abcd-ef"] {
            let err = bad.parse::<YearMonth>().unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "{bad:?} gave {err:?}");
        }
    }

    #[test]
    fn month_arithmetic_crosses_year_boundaries() {
        assert_eq!(ym("2026-02").add_months(-2), ym("2025-12"));
        assert_eq!(ym("2025-11").add_months(14), ym("2027-01"));
        assert_eq!(ym("2025-12").months_until(ym("2026-02")), 2);
        assert_eq!(ym("2026-02").months_until(ym("2025-12")), -2);
    }

    #[test]
    fn month_of_date_and_first_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let month = YearMonth::of(date);
        assert_eq!(month, ym("2026-10"));
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2026, 10, 1));
    }

    #[test]
    fn ordering_follows_the_calendar() {
        assert!(ym("2025-12") < ym("2026-01"));
        assert!(ym("2026-01") < ym("2026-02"));
    }
}
