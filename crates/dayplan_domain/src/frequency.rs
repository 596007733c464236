use chrono::{Datelike, NaiveDate, Weekday};

use crate::activity::{ActivityFrequency, MonthlySchedule, Ordinal, OrdinalRule, StartWeek};
use crate::period::{last_day_of_month, week_start};

/// Decide whether a recurrence rule fires on `date`.
///
/// Pure function over the rule, the date, the activity's optional start
/// date and the week convention. Weekday indices are 1..=7, Monday = 1.
pub fn occurs(
    frequency: &ActivityFrequency,
    date: NaiveDate,
    start_date: Option<NaiveDate>,
    first_weekday: Weekday,
) -> bool {
    match frequency {
        ActivityFrequency::Daily => start_date.map_or(true, |start| date >= start),
        ActivityFrequency::Weekly { days } => {
            days.contains(&date.weekday().number_from_monday())
        }
        ActivityFrequency::Biweekly { days, start_week } => {
            days.contains(&date.weekday().number_from_monday())
                && in_active_week(date, start_date, *start_week, first_weekday)
        }
        ActivityFrequency::Monthly { schedule } => match schedule {
            MonthlySchedule::SpecificDates(dates) => fires_on_specific_date(dates, date),
            MonthlySchedule::WeekdayOrdinal(rules) => {
                rules.iter().any(|rule| fires_on_ordinal(rule, date))
            }
        },
    }
}

/// Weeks alternate starting from the week containing the activity's start
/// date (or the evaluated date when absent); `StartWeek::Next` flips the
/// parity by one week. A week is active when the whole-week distance is
/// even.
fn in_active_week(
    date: NaiveDate,
    start_date: Option<NaiveDate>,
    start_week: StartWeek,
    first_weekday: Weekday,
) -> bool {
    let anchor = start_date.unwrap_or(date);
    let anchor_week = week_start(anchor, first_weekday);
    let date_week = week_start(date, first_weekday);
    let weeks_since = (date_week - anchor_week).num_days() / 7;
    let offset = match start_week {
        StartWeek::Current => 0,
        StartWeek::Next => 1,
    };
    (weeks_since + offset).rem_euclid(2) == 0
}

/// Day-of-month match with the clamp policy: a requested day past the end
/// of a short month fires on that month's last day instead.
fn fires_on_specific_date(dates: &std::collections::BTreeSet<u32>, date: NaiveDate) -> bool {
    if dates.contains(&date.day()) {
        return true;
    }
    let Some(last) = last_day_of_month(date) else {
        return false;
    };
    date == last && dates.iter().any(|&requested| requested > last.day())
}

fn fires_on_ordinal(rule: &OrdinalRule, date: NaiveDate) -> bool {
    if !rule.days.contains(&date.weekday().number_from_monday()) {
        return false;
    }
    let Some(last) = last_day_of_month(date) else {
        return false;
    };
    let nth_from_start = (date.day() - 1) / 7 + 1;
    let nth_from_end = (last.day() - date.day()) / 7 + 1;
    match rule.ordinal {
        Ordinal::First => nth_from_start == 1,
        Ordinal::Second => nth_from_start == 2,
        Ordinal::Third => nth_from_start == 3,
        Ordinal::Fourth => nth_from_start == 4,
        Ordinal::SecondToLast => nth_from_end == 2,
        Ordinal::Last => nth_from_end == 1,
    }
}
