use chrono::Weekday;
use tracing::debug;

use crate::activity::Activity;
use crate::day::{Day, DayActivity};
use crate::frequency::occurs;
use crate::period::DateRange;

/// Materialize one `Day` per date in `range`, reconciled against whatever
/// is already persisted.
///
/// Persisted occurrences are kept; regeneration only ever adds. For each
/// date, every visible activity whose rule fires (and whose start date is
/// not in the future) gets an occurrence, at most one per
/// `(activity, date)` pair. Kept generated occurrences are back-filled
/// from a fresh template so catalog changes reach fields the user never
/// touched, without overwriting edits. Empty or inverted ranges compose
/// to nothing.
pub fn compose_days(
    activities: &[Activity],
    range: &DateRange,
    existing: &[Day],
    first_weekday: Weekday,
) -> Vec<Day> {
    let mut result = Vec::new();

    for date in range.days() {
        let mut day = existing
            .iter()
            .find(|candidate| candidate.date == date)
            .cloned()
            .unwrap_or_else(|| Day::new(date));

        for activity in activities {
            if !activity.visible {
                continue;
            }
            if activity.start_date.is_some_and(|start| date < start) {
                continue;
            }
            let Some(frequency) = &activity.frequency else {
                // Frequency-less activities only exist on a day when the
                // user placed one there manually; keep those as-is.
                continue;
            };
            if !occurs(frequency, date, activity.start_date, first_weekday) {
                continue;
            }

            let template = DayActivity::from_template(activity, date);
            match day
                .activities
                .iter_mut()
                .find(|occurrence| occurrence.activity_id == activity.id)
            {
                Some(kept) if kept.generated => kept.merge_from(&template),
                Some(_) => {}
                None => day.activities.push(template),
            }
        }

        result.push(day);
    }

    debug!(
        start = %range.start,
        end = %range.end,
        days = result.len(),
        "composed day range"
    );
    result
}
