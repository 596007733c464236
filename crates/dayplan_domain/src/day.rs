use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;

/// One calendar date plus the occurrences materialized for it. Identity is
/// the date: composition produces at most one `Day` per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    pub activities: Vec<DayActivity>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            activities: Vec::new(),
        }
    }

    pub fn occurrence_of(&self, activity_id: &str) -> Option<&DayActivity> {
        self.activities
            .iter()
            .find(|occurrence| occurrence.activity_id == activity_id)
    }

    /// True when any occurrence of the given activity on this day carries
    /// a done date.
    pub fn completed(&self, activity_id: &str) -> bool {
        self.activities
            .iter()
            .any(|occurrence| occurrence.activity_id == activity_id && occurrence.is_done())
    }

    pub fn take_occurrence(&mut self, occurrence_id: &str) -> Option<DayActivity> {
        let index = self
            .activities
            .iter()
            .position(|occurrence| occurrence.id == occurrence_id)?;
        Some(self.activities.remove(index))
    }
}

/// One occurrence of an `Activity` on one `Day`.
///
/// Generated occurrences use the deterministic id `<activity_id>@<date>`,
/// which keeps the id stable across regenerations of the same range.
/// `duration_min == 0` means the duration was never set; the fill-gaps
/// merge treats it as a hole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayActivity {
    pub id: String,
    pub activity_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub duration_min: u32,
    pub overview: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub done_date: Option<NaiveDate>,
    pub reminder_date: Option<NaiveDate>,
    pub generated: bool,
    pub tasks: Vec<DayTask>,
    pub tags: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

impl DayActivity {
    /// Synthesize a fresh occurrence from a catalog template for a date.
    pub fn from_template(activity: &Activity, date: NaiveDate) -> Self {
        Self {
            id: occurrence_id(&activity.id, date),
            activity_id: activity.id.clone(),
            name: activity.name.clone(),
            icon: activity.icon.clone(),
            duration_min: activity.default_duration_min.unwrap_or(0),
            overview: None,
            due_date: Some(date),
            done_date: None,
            reminder_date: None,
            generated: true,
            tasks: Vec::new(),
            tags: activity.tags.clone(),
            labels: activity.labels.clone(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.done_date.is_some()
    }

    /// One-directional fill-gaps merge: every unset field on `self` is
    /// back-filled from `other`; fields already set are never overwritten.
    pub fn merge_from(&mut self, other: &DayActivity) {
        if self.icon.is_none() {
            self.icon = other.icon.clone();
        }
        if self.due_date.is_none() {
            self.due_date = other.due_date;
        }
        if self.done_date.is_none() {
            self.done_date = other.done_date;
        }
        if self.duration_min == 0 {
            self.duration_min = other.duration_min;
        }
        if self.reminder_date.is_none() {
            self.reminder_date = other.reminder_date;
        }
        if self.overview.is_none() {
            self.overview = other.overview.clone();
        }
    }

    /// Whether completing `toggled_task_id` should prompt the user to
    /// complete the whole occurrence: not yet done, has subtasks, and all
    /// subtasks except possibly the toggled one are done.
    pub fn should_prompt_completion(&self, toggled_task_id: &str) -> bool {
        if self.is_done() || self.tasks.is_empty() {
            return false;
        }
        self.tasks
            .iter()
            .all(|task| task.done_date.is_some() || task.id == toggled_task_id)
    }
}

/// Subtask of a `DayActivity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayTask {
    pub id: String,
    pub name: String,
    pub duration_min: u32,
    pub overview: Option<String>,
    pub done_date: Option<NaiveDate>,
    pub reminder_date: Option<NaiveDate>,
    pub position: u32,
}

/// Deterministic id for a generated occurrence of `activity_id` on `date`.
pub fn occurrence_id(activity_id: &str, date: NaiveDate) -> String {
    format!("{}@{}", activity_id, date.format("%Y-%m-%d"))
}
