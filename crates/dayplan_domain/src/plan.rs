use serde::{Deserialize, Serialize};

use crate::day::Day;
use crate::period::{DateRange, Period};

/// Window kinds a plan can cover. The four non-custom kinds form the
/// required set the plan composer keeps alive around "today".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Custom,
}

impl PeriodKind {
    /// Kinds that must always have a plan covering today, widest first.
    pub const REQUIRED: [PeriodKind; 4] = [
        PeriodKind::Quarterly,
        PeriodKind::Monthly,
        PeriodKind::Weekly,
        PeriodKind::Daily,
    ];

    /// Calendar period backing this kind; `Custom` has none.
    pub fn period(self) -> Option<Period> {
        match self {
            PeriodKind::Daily => Some(Period::Day),
            PeriodKind::Weekly => Some(Period::Week),
            PeriodKind::Monthly => Some(Period::Month),
            PeriodKind::Quarterly => Some(Period::Quarter),
            PeriodKind::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Quarterly => "quarterly",
            PeriodKind::Custom => "custom",
        }
    }
}

impl From<Period> for PeriodKind {
    fn from(period: Period) -> Self {
        match period {
            Period::Day => PeriodKind::Daily,
            Period::Week => PeriodKind::Weekly,
            Period::Month => PeriodKind::Monthly,
            Period::Quarter => PeriodKind::Quarterly,
        }
    }
}

/// Persisted named window over a closed date range. Days are stored
/// per-date and joined back on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: String,
    pub kind: PeriodKind,
    pub range: DateRange,
}

impl Plan {
    pub fn new(kind: PeriodKind, range: DateRange) -> Self {
        Self {
            id: format!("{}-{}", kind.as_str(), range.start.format("%Y-%m-%d")),
            kind,
            range,
        }
    }
}

/// Read model for on-demand period browsing: same shape as a plan plus
/// its composed days, computed lazily and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimePeriod {
    pub kind: PeriodKind,
    pub range: DateRange,
    pub days: Vec<Day>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn plan_ids_are_stable_per_kind_and_start() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        let plan = Plan::new(PeriodKind::Quarterly, range);
        assert_eq!(plan.id, "quarterly-2024-01-01");
        assert_eq!(plan, Plan::new(PeriodKind::Quarterly, range));
    }

    #[test]
    fn required_kinds_cover_all_non_custom_windows() {
        assert_eq!(PeriodKind::REQUIRED.len(), 4);
        assert!(PeriodKind::REQUIRED
            .iter()
            .all(|kind| kind.period().is_some()));
    }
}
