use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::day::Day;

/// Duration and completion figures derived from one day or a whole
/// period of days.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DaySummary {
    pub total_min: u32,
    pub remaining_min: u32,
    /// Fraction of occurrences done, in [0, 1]. Zero for empty days.
    pub completion: f64,
    /// Each occurrence contributes its full duration to every tag on its
    /// source activity.
    pub tag_minutes: BTreeMap<String, u32>,
}

pub fn summarize_day(day: &Day) -> DaySummary {
    summarize_days(std::slice::from_ref(day))
}

pub fn summarize_days(days: &[Day]) -> DaySummary {
    let mut summary = DaySummary::default();
    let mut total_count: u32 = 0;
    let mut done_count: u32 = 0;

    for day in days {
        for occurrence in &day.activities {
            total_count += 1;
            summary.total_min = summary.total_min.saturating_add(occurrence.duration_min);
            if occurrence.is_done() {
                done_count += 1;
            } else {
                summary.remaining_min =
                    summary.remaining_min.saturating_add(occurrence.duration_min);
            }
            for tag in &occurrence.tags {
                *summary.tag_minutes.entry(tag.clone()).or_insert(0) += occurrence.duration_min;
            }
        }
    }

    summary.completion = if total_count == 0 {
        0.0
    } else {
        (f64::from(done_count) / f64::from(total_count)).clamp(0.0, 1.0)
    };
    summary
}
