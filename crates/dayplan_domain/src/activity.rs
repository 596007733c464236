use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog definition of a recurring activity. Immutable template; every
/// occurrence generated from it references it by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub frequency: Option<ActivityFrequency>,
    /// Default duration in whole minutes, copied onto new occurrences.
    pub default_duration_min: Option<u32>,
    pub visible: bool,
    pub start_date: Option<NaiveDate>,
    pub tags: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

impl Activity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
            frequency: None,
            default_duration_min: None,
            visible: true,
            start_date: None,
            tags: BTreeSet::new(),
            labels: BTreeSet::new(),
        }
    }
}

/// Recurrence rule. Weekday indices are 1..=7 with Monday = 1, matching
/// `chrono::Weekday::number_from_monday`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityFrequency {
    Daily,
    Weekly {
        days: BTreeSet<u32>,
    },
    Biweekly {
        days: BTreeSet<u32>,
        start_week: StartWeek,
    },
    Monthly {
        schedule: MonthlySchedule,
    },
}

/// Which alternating week a biweekly rule begins on, relative to the week
/// containing the activity's start date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StartWeek {
    Current,
    Next,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MonthlySchedule {
    /// Days of month, 1..=31. Values past the end of a short month clamp
    /// to that month's last day.
    SpecificDates(BTreeSet<u32>),
    WeekdayOrdinal(Vec<OrdinalRule>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrdinalRule {
    pub ordinal: Ordinal,
    pub days: BTreeSet<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    SecondToLast,
    Last,
}
