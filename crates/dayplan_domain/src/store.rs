use chrono::NaiveDate;

use crate::activity::Activity;
use crate::day::Day;
use crate::error::DomainError;
use crate::period::DateRange;
use crate::plan::{PeriodKind, Plan};

/// Narrowing criteria for day loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayFilter {
    /// Restrict to days containing an occurrence of this activity.
    pub activity_id: Option<String>,
    /// Restrict to days carrying at least one not-done occurrence.
    pub open_only: bool,
}

impl DayFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_activity(activity_id: impl Into<String>) -> Self {
        Self {
            activity_id: Some(activity_id.into()),
            open_only: false,
        }
    }

    pub fn open() -> Self {
        Self {
            activity_id: None,
            open_only: true,
        }
    }

    pub fn matches(&self, day: &Day) -> bool {
        if let Some(activity_id) = &self.activity_id {
            if day.occurrence_of(activity_id).is_none() {
                return false;
            }
        }
        if self.open_only
            && !day
                .activities
                .iter()
                .any(|occurrence| !occurrence.is_done())
        {
            return false;
        }
        true
    }
}

/// Source of activity definitions.
pub trait ActivityCatalog: Send + Sync {
    fn load_activities(&self) -> Result<Vec<Activity>, DomainError>;
}

/// Persistence boundary for days and their occurrences. The core awaits
/// these calls sequentially; it never assumes concurrent writers on the
/// same range.
pub trait DayStore: Send + Sync {
    fn load_days(&self, range: &DateRange, filter: &DayFilter) -> Result<Vec<Day>, DomainError>;

    /// Persist the given days as one logical transaction.
    fn save_days(&self, days: &[Day]) -> Result<(), DomainError>;

    /// Relocate one occurrence between days, advancing its due date to
    /// the target date.
    fn move_occurrence(
        &self,
        occurrence_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(), DomainError>;
}

/// Persistence boundary for plans.
pub trait PlanStore: Send + Sync {
    fn load_plans(
        &self,
        covering: NaiveDate,
        kind: Option<PeriodKind>,
    ) -> Result<Vec<Plan>, DomainError>;

    fn save_plan(&self, plan: &Plan) -> Result<(), DomainError>;
}
