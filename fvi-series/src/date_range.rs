use chrono::{Datelike, NaiveDate};

/// Inclusive window of calendar dates requested from a data source.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Window of `years` calendar years ending on `end`.
    ///
    /// A Feb 29 start that does not exist in the target year falls back to Feb 28.
    pub fn trailing_years(end: NaiveDate, years: u32) -> Self {
        let target_year = end.year() - years as i32;
        let start = end
            .with_year(target_year)
            .or_else(|| NaiveDate::from_ymd_opt(target_year, end.month(), 28))
            .unwrap_or(end);
        DateRange(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    pub fn end(&self) -> NaiveDate {
        self.1
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date <= self.1
    }

    pub fn is_empty(&self) -> bool {
        self.0 > self.1
    }
}
