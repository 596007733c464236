use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Calendar window shapes the range calculator understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
}

/// Closed date range, inclusive of both boundary days. An inverted range
/// (`start > end`) is treated as empty rather than an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterate every date in the range, oldest first. Empty for inverted
    /// ranges.
    pub fn days(&self) -> DateRangeDays {
        DateRangeDays {
            next: if self.is_empty() {
                None
            } else {
                Some(self.start)
            },
            end: self.end,
        }
    }
}

pub struct DateRangeDays {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateRangeDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = match current.succ_opt() {
            Some(following) if following <= self.end => Some(following),
            _ => None,
        };
        Some(current)
    }
}

/// Resolve the closed range for `period` anchored at `anchor`, shifted
/// forwards (positive) or backwards (negative) by whole periods. Weeks
/// start on `first_weekday`.
pub fn period_range(
    period: Period,
    anchor: NaiveDate,
    shift: i32,
    first_weekday: Weekday,
) -> Result<DateRange, DomainError> {
    let arithmetic = || DomainError::DateArithmetic { anchor, shift };

    match period {
        Period::Day => {
            let day = shift_days(anchor, i64::from(shift)).ok_or_else(arithmetic)?;
            Ok(DateRange::single(day))
        }
        Period::Week => {
            let target =
                shift_days(anchor, 7 * i64::from(shift)).ok_or_else(arithmetic)?;
            let back = days_since(first_weekday, target.weekday());
            let start = shift_days(target, -i64::from(back)).ok_or_else(arithmetic)?;
            let end = shift_days(start, 6).ok_or_else(arithmetic)?;
            Ok(DateRange::new(start, end))
        }
        Period::Month => {
            let shifted = shift_months(anchor, shift).ok_or_else(arithmetic)?;
            let start = shifted.with_day(1).ok_or_else(arithmetic)?;
            let end = last_day_of_month(start).ok_or_else(arithmetic)?;
            Ok(DateRange::new(start, end))
        }
        Period::Quarter => {
            let shifted = shift_months(anchor, 3 * shift).ok_or_else(arithmetic)?;
            let quarter_start_month = (shifted.month0() / 3) * 3 + 1;
            let start = NaiveDate::from_ymd_opt(shifted.year(), quarter_start_month, 1)
                .ok_or_else(arithmetic)?;
            let quarter_end_first = shift_months(start, 2).ok_or_else(arithmetic)?;
            let end = last_day_of_month(quarter_end_first).ok_or_else(arithmetic)?;
            Ok(DateRange::new(start, end))
        }
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Last day of the month containing `date`.
pub(crate) fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    first
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))
}

/// Days from `first` forward to `weekday`, 0..=6.
pub(crate) fn days_since(first: Weekday, weekday: Weekday) -> u32 {
    (7 + weekday.num_days_from_monday() - first.num_days_from_monday()) % 7
}

/// Start of the week containing `date`, by the `first_weekday` convention.
pub(crate) fn week_start(date: NaiveDate, first_weekday: Weekday) -> NaiveDate {
    let back = days_since(first_weekday, date.weekday());
    // 0..=6 days back never leaves the calendar for any real date.
    shift_days(date, -i64::from(back)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_range_applies_shift_in_days() {
        let range = period_range(Period::Day, date(2024, 1, 3), 0, Weekday::Mon).unwrap();
        assert_eq!(range, DateRange::single(date(2024, 1, 3)));

        let shifted = period_range(Period::Day, date(2024, 1, 3), -2, Weekday::Mon).unwrap();
        assert_eq!(shifted, DateRange::single(date(2024, 1, 1)));
    }

    #[test]
    fn week_range_honors_first_weekday() {
        // 2024-01-03 is a Wednesday.
        let range = period_range(Period::Week, date(2024, 1, 3), 0, Weekday::Mon).unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 7));

        let sunday_first = period_range(Period::Week, date(2024, 1, 3), 0, Weekday::Sun).unwrap();
        assert_eq!(sunday_first.start, date(2023, 12, 31));
        assert_eq!(sunday_first.end, date(2024, 1, 6));
    }

    #[test]
    fn week_range_shifts_by_whole_weeks() {
        let range = period_range(Period::Week, date(2024, 1, 3), 1, Weekday::Mon).unwrap();
        assert_eq!(range.start, date(2024, 1, 8));
        assert_eq!(range.end, date(2024, 1, 14));
    }

    #[test]
    fn month_range_spans_first_to_last_day() {
        let range = period_range(Period::Month, date(2024, 2, 14), 0, Weekday::Mon).unwrap();
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));

        let shifted = period_range(Period::Month, date(2024, 1, 31), 1, Weekday::Mon).unwrap();
        assert_eq!(shifted.start, date(2024, 2, 1));
        assert_eq!(shifted.end, date(2024, 2, 29));
    }

    #[test]
    fn quarter_range_covers_three_months() {
        let range = period_range(Period::Quarter, date(2024, 5, 10), 0, Weekday::Mon).unwrap();
        assert_eq!(range.start, date(2024, 4, 1));
        assert_eq!(range.end, date(2024, 6, 30));

        let previous = period_range(Period::Quarter, date(2024, 5, 10), -1, Weekday::Mon).unwrap();
        assert_eq!(previous.start, date(2024, 1, 1));
        assert_eq!(previous.end, date(2024, 3, 31));
    }

    #[test]
    fn arithmetic_failure_is_an_error_not_a_panic() {
        let result = period_range(Period::Day, NaiveDate::MAX, 1, Weekday::Mon);
        assert!(matches!(result, Err(DomainError::DateArithmetic { .. })));
    }

    #[test]
    fn inverted_range_iterates_nothing() {
        let range = DateRange::new(date(2024, 1, 5), date(2024, 1, 1));
        assert!(range.is_empty());
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn range_iterates_inclusive_of_both_ends() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3));
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
    }
}
