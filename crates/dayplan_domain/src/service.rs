use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Weekday};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::advance::{overdue_moves, OccurrenceMove};
use crate::compose::compose_days;
use crate::day::Day;
use crate::error::DomainError;
use crate::frequency::occurs;
use crate::history::{HistoryEvent, HistoryLog};
use crate::period::{period_range, DateRange, Period};
use crate::plan::{PeriodKind, Plan, TimePeriod};
use crate::reminders::{ReminderRequest, ReminderSink};
use crate::store::{ActivityCatalog, DayFilter, DayStore, PlanStore};
use crate::streak::{streak_for, Streak};
use crate::summary::{summarize_day, DaySummary};

const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Orchestrates composition, plan upkeep, due-date advancement and the
/// derived analytics over the injected store collaborators. All heavy
/// lifting stays in the pure modules; this type sequences the store
/// round-trips and keeps the bounded history log.
pub struct PlanService {
    catalog: Box<dyn ActivityCatalog>,
    days: Box<dyn DayStore>,
    plans: Box<dyn PlanStore>,
    reminders: Option<Box<dyn ReminderSink>>,
    history: RwLock<HistoryLog>,
    first_weekday: Weekday,
}

pub struct PlanServiceBuilder {
    catalog: Option<Box<dyn ActivityCatalog>>,
    days: Option<Box<dyn DayStore>>,
    plans: Option<Box<dyn PlanStore>>,
    reminders: Option<Box<dyn ReminderSink>>,
    history_capacity: usize,
    first_weekday: Weekday,
}

impl PlanServiceBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            days: None,
            plans: None,
            reminders: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            first_weekday: Weekday::Mon,
        }
    }

    pub fn with_catalog(mut self, catalog: Box<dyn ActivityCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_day_store(mut self, days: Box<dyn DayStore>) -> Self {
        self.days = Some(days);
        self
    }

    pub fn with_plan_store(mut self, plans: Box<dyn PlanStore>) -> Self {
        self.plans = Some(plans);
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminders = Some(sink);
        self
    }

    pub fn with_first_weekday(mut self, first_weekday: Weekday) -> Self {
        self.first_weekday = first_weekday;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<PlanService> {
        Ok(PlanService {
            catalog: self.catalog.ok_or_else(|| anyhow!("activity catalog required"))?,
            days: self.days.ok_or_else(|| anyhow!("day store required"))?,
            plans: self.plans.ok_or_else(|| anyhow!("plan store required"))?,
            reminders: self.reminders,
            history: RwLock::new(HistoryLog::new(self.history_capacity)),
            first_weekday: self.first_weekday,
        })
    }
}

impl Default for PlanServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanService {
    pub fn builder() -> PlanServiceBuilder {
        PlanServiceBuilder::new()
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    /// Compose and persist every day in `range`, preserving whatever was
    /// already stored. Returns the full merged day set. One `save_days`
    /// call makes the write a single logical transaction.
    #[instrument(skip(self))]
    pub fn compose_range(&self, range: &DateRange) -> Result<Vec<Day>, DomainError> {
        if range.is_empty() {
            debug!(start = %range.start, end = %range.end, "skipping empty range");
            return Ok(Vec::new());
        }
        let activities = self.catalog.load_activities()?;
        let existing = self.days.load_days(range, &DayFilter::all())?;
        let composed = compose_days(&activities, range, &existing, self.first_weekday);
        self.days.save_days(&composed)?;
        self.schedule_reminders(&composed);
        self.history.write().record(HistoryEvent::RangeComposed {
            range: *range,
            days: composed.len(),
        });
        Ok(composed)
    }

    /// Ensure a plan of every required kind covers `date`, creating the
    /// missing ones. Idempotent: existing plan kinds are checked before
    /// anything is created.
    #[instrument(skip(self))]
    pub fn compose_plans(&self, date: NaiveDate) -> Result<Vec<Plan>, DomainError> {
        let mut created = Vec::new();
        for kind in PeriodKind::REQUIRED {
            let Some(period) = kind.period() else {
                continue;
            };
            if !self.plans.load_plans(date, Some(kind))?.is_empty() {
                continue;
            }
            let range = period_range(period, date, 0, self.first_weekday)?;
            self.compose_range(&range)?;
            let plan = Plan::new(kind, range);
            self.plans.save_plan(&plan)?;
            info!(kind = kind.as_str(), start = %range.start, end = %range.end, "created plan");
            self.history
                .write()
                .record(HistoryEvent::PlanCreated { kind, range });
            created.push(plan);
        }
        Ok(created)
    }

    /// Roll still-actionable open occurrences from past days onto
    /// `today`. Runs once per "today" transition; the store applies each
    /// relocation.
    #[instrument(skip(self))]
    pub fn advance_overdue(&self, today: NaiveDate) -> Result<Vec<OccurrenceMove>, DomainError> {
        let Some(yesterday) = today.pred_opt() else {
            return Ok(Vec::new());
        };
        // Days only materialize inside plan windows, so the current and
        // previous quarter bound how far back a stale occurrence can live.
        let lookback = period_range(Period::Quarter, today, -1, self.first_weekday)?;
        let range = DateRange::new(lookback.start, yesterday);
        let stale = self.days.load_days(&range, &DayFilter::open())?;
        let moves = overdue_moves(&stale, today);
        for planned in &moves {
            self.days
                .move_occurrence(&planned.occurrence_id, planned.from, planned.to)?;
            self.history
                .write()
                .record(HistoryEvent::OccurrenceAdvanced {
                    occurrence_id: planned.occurrence_id.clone(),
                    from: planned.from,
                    to: planned.to,
                });
        }
        if !moves.is_empty() {
            info!(count = moves.len(), "advanced overdue occurrences");
        }
        Ok(moves)
    }

    /// Lazily composed read model for browsing one calendar period.
    /// Nothing is persisted.
    pub fn time_period(
        &self,
        period: Period,
        anchor: NaiveDate,
        shift: i32,
    ) -> Result<TimePeriod, DomainError> {
        let range = period_range(period, anchor, shift, self.first_weekday)?;
        Ok(TimePeriod {
            kind: PeriodKind::from(period),
            range,
            days: self.compose_readonly(&range)?,
        })
    }

    /// Read model over an arbitrary user-chosen range.
    pub fn custom_period(&self, range: DateRange) -> Result<TimePeriod, DomainError> {
        Ok(TimePeriod {
            kind: PeriodKind::Custom,
            range,
            days: self.compose_readonly(&range)?,
        })
    }

    /// Streak figures for one activity as of `today`, computed fresh from
    /// its stored history. Unknown activities yield the zero streak.
    pub fn streak(&self, activity_id: &str, today: NaiveDate) -> Result<Streak, DomainError> {
        let activities = self.catalog.load_activities()?;
        let Some(activity) = activities.iter().find(|a| a.id == activity_id) else {
            return Ok(Streak::default());
        };
        let start = match activity.start_date {
            Some(start) => start,
            None => {
                period_range(Period::Quarter, today, -1, self.first_weekday)?.start
            }
        };
        let range = DateRange::new(start, today);
        let stored = self
            .days
            .load_days(&range, &DayFilter::for_activity(activity_id))?;
        // Walk the scheduled dates most-recent-first; a scheduled date
        // with no stored day is a miss, unscheduled dates do not count.
        let mut history: Vec<Day> = match &activity.frequency {
            Some(frequency) => range
                .days()
                .filter(|&date| occurs(frequency, date, activity.start_date, self.first_weekday))
                .map(|date| {
                    stored
                        .iter()
                        .find(|day| day.date == date)
                        .cloned()
                        .unwrap_or_else(|| Day::new(date))
                })
                .collect(),
            None => stored,
        };
        history.reverse();
        Ok(streak_for(activity_id, &history))
    }

    /// Duration and completion summary for a single stored date.
    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary, DomainError> {
        let loaded = self
            .days
            .load_days(&DateRange::single(date), &DayFilter::all())?;
        let day = loaded
            .into_iter()
            .find(|day| day.date == date)
            .unwrap_or_else(|| Day::new(date));
        Ok(summarize_day(&day))
    }

    pub fn history(&self) -> Vec<HistoryEvent> {
        self.history.read().entries().cloned().collect()
    }

    fn compose_readonly(&self, range: &DateRange) -> Result<Vec<Day>, DomainError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let activities = self.catalog.load_activities()?;
        let existing = self.days.load_days(range, &DayFilter::all())?;
        Ok(compose_days(
            &activities,
            range,
            &existing,
            self.first_weekday,
        ))
    }

    fn schedule_reminders(&self, days: &[Day]) {
        let Some(sink) = &self.reminders else {
            return;
        };
        for day in days {
            for occurrence in &day.activities {
                let Some(remind_on) = occurrence.reminder_date else {
                    continue;
                };
                if occurrence.is_done() {
                    sink.cancel_for_occurrence(&occurrence.id);
                    continue;
                }
                sink.schedule(ReminderRequest {
                    occurrence_id: occurrence.id.clone(),
                    title: format!("Activity: {}", occurrence.name),
                    body: format!("Planned for {}", day.date),
                    remind_on,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{Activity, ActivityFrequency};
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct MemoryCatalog {
        activities: Vec<Activity>,
    }

    impl ActivityCatalog for MemoryCatalog {
        fn load_activities(&self) -> Result<Vec<Activity>, DomainError> {
            Ok(self.activities.clone())
        }
    }

    #[derive(Default, Clone)]
    struct MemoryDays {
        days: Arc<Mutex<BTreeMap<NaiveDate, Day>>>,
    }

    impl DayStore for MemoryDays {
        fn load_days(
            &self,
            range: &DateRange,
            filter: &DayFilter,
        ) -> Result<Vec<Day>, DomainError> {
            Ok(self
                .days
                .lock()
                .values()
                .filter(|day| range.contains(day.date) && filter.matches(day))
                .cloned()
                .collect())
        }

        fn save_days(&self, days: &[Day]) -> Result<(), DomainError> {
            let mut stored = self.days.lock();
            for day in days {
                stored.insert(day.date, day.clone());
            }
            Ok(())
        }

        fn move_occurrence(
            &self,
            occurrence_id: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<(), DomainError> {
            let mut stored = self.days.lock();
            let mut occurrence = stored
                .get_mut(&from)
                .and_then(|day| day.take_occurrence(occurrence_id))
                .ok_or_else(|| {
                    DomainError::StoreUnavailable(format!("no occurrence {occurrence_id}"))
                })?;
            occurrence.due_date = Some(to);
            stored
                .entry(to)
                .or_insert_with(|| Day::new(to))
                .activities
                .push(occurrence);
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct MemoryPlans {
        plans: Arc<Mutex<Vec<Plan>>>,
    }

    impl PlanStore for MemoryPlans {
        fn load_plans(
            &self,
            covering: NaiveDate,
            kind: Option<PeriodKind>,
        ) -> Result<Vec<Plan>, DomainError> {
            Ok(self
                .plans
                .lock()
                .iter()
                .filter(|plan| plan.range.contains(covering))
                .filter(|plan| kind.map_or(true, |wanted| plan.kind == wanted))
                .cloned()
                .collect())
        }

        fn save_plan(&self, plan: &Plan) -> Result<(), DomainError> {
            self.plans.lock().push(plan.clone());
            Ok(())
        }
    }

    fn daily_activity(id: &str) -> Activity {
        let mut activity = Activity::new(id, id);
        activity.frequency = Some(ActivityFrequency::Daily);
        activity
    }

    fn service_with(
        activities: Vec<Activity>,
    ) -> (PlanService, MemoryDays, MemoryPlans) {
        let days = MemoryDays::default();
        let plans = MemoryPlans::default();
        let service = PlanService::builder()
            .with_catalog(Box::new(MemoryCatalog { activities }))
            .with_day_store(Box::new(days.clone()))
            .with_plan_store(Box::new(plans.clone()))
            .build()
            .unwrap();
        (service, days, plans)
    }

    #[test]
    fn builder_requires_all_stores() {
        assert!(PlanService::builder().build().is_err());
    }

    #[test]
    fn compose_plans_creates_each_required_kind_once() {
        let (service, _, plans) = service_with(vec![daily_activity("run")]);
        let today = date(2024, 5, 10);

        let created = service.compose_plans(today).unwrap();
        assert_eq!(created.len(), 4);

        let repeat = service.compose_plans(today).unwrap();
        assert!(repeat.is_empty());
        assert_eq!(plans.plans.lock().len(), 4);
    }

    #[test]
    fn compose_range_persists_and_stays_idempotent() {
        let (service, days, _) = service_with(vec![daily_activity("run")]);
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3));

        let first = service.compose_range(&range).unwrap();
        let second = service.compose_range(&range).unwrap();
        assert_eq!(first, second);
        assert_eq!(days.days.lock().len(), 3);
        assert!(days
            .days
            .lock()
            .values()
            .all(|day| day.activities.len() == 1));
    }

    #[test]
    fn compose_range_preserves_user_edits_across_runs() {
        let (service, days, _) = service_with(vec![daily_activity("run")]);
        let range = DateRange::single(date(2024, 1, 1));
        service.compose_range(&range).unwrap();

        days.days
            .lock()
            .get_mut(&date(2024, 1, 1))
            .unwrap()
            .activities[0]
            .done_date = Some(date(2024, 1, 1));

        let recomposed = service.compose_range(&range).unwrap();
        assert_eq!(
            recomposed[0].activities[0].done_date,
            Some(date(2024, 1, 1))
        );
    }

    #[test]
    fn advance_overdue_relocates_open_occurrences() {
        let (service, days, _) = service_with(vec![daily_activity("run")]);
        let range = DateRange::new(date(2024, 5, 8), date(2024, 5, 9));
        service.compose_range(&range).unwrap();

        let today = date(2024, 5, 10);
        let moves = service.advance_overdue(today).unwrap();
        assert_eq!(moves.len(), 2);

        let stored = days.days.lock();
        assert!(stored.get(&date(2024, 5, 8)).unwrap().activities.is_empty());
        let today_day = stored.get(&today).unwrap();
        assert_eq!(today_day.activities.len(), 2);
        assert!(today_day
            .activities
            .iter()
            .all(|occurrence| occurrence.due_date == Some(today)));
        drop(stored);

        // Re-evaluating the same today finds nothing left to move.
        assert!(service.advance_overdue(today).unwrap().is_empty());
    }

    #[test]
    fn time_period_composes_without_persisting() {
        let (service, days, _) = service_with(vec![daily_activity("run")]);
        let period = service
            .time_period(Period::Week, date(2024, 1, 3), 0)
            .unwrap();
        assert_eq!(period.kind, PeriodKind::Weekly);
        assert_eq!(period.days.len(), 7);
        assert!(days.days.lock().is_empty());
    }

    #[test]
    fn streak_reads_history_most_recent_first() {
        let mut activity = daily_activity("run");
        activity.start_date = Some(date(2024, 5, 8));
        let (service, days, _) = service_with(vec![activity]);

        let range = DateRange::new(date(2024, 5, 8), date(2024, 5, 10));
        service.compose_range(&range).unwrap();
        {
            let mut stored = days.days.lock();
            for done_on in [date(2024, 5, 9), date(2024, 5, 10)] {
                stored.get_mut(&done_on).unwrap().activities[0].done_date = Some(done_on);
            }
        }

        let streak = service.streak("run", date(2024, 5, 10)).unwrap();
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 2);
        assert_eq!(streak.next, 4);
    }

    #[test]
    fn weekly_streak_counts_scheduled_dates_only() {
        let mut activity = Activity::new("gym", "Gym");
        activity.frequency = Some(ActivityFrequency::Weekly {
            days: BTreeSet::from([2]),
        });
        activity.start_date = Some(date(2024, 4, 30));
        let (service, days, _) = service_with(vec![activity]);

        // Three consecutive Tuesdays, all completed.
        let range = DateRange::new(date(2024, 4, 30), date(2024, 5, 14));
        service.compose_range(&range).unwrap();
        {
            let mut stored = days.days.lock();
            for done_on in [date(2024, 4, 30), date(2024, 5, 7), date(2024, 5, 14)] {
                stored.get_mut(&done_on).unwrap().activities[0].done_date = Some(done_on);
            }
        }

        let streak = service.streak("gym", date(2024, 5, 14)).unwrap();
        assert_eq!(streak.current, 3);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.next, 4);
    }

    #[test]
    fn unknown_activity_streak_is_zero() {
        let (service, _, _) = service_with(vec![]);
        let streak = service.streak("ghost", date(2024, 5, 10)).unwrap();
        assert_eq!(streak, Streak::default());
    }

    #[test]
    fn day_summary_of_missing_day_is_empty() {
        let (service, _, _) = service_with(vec![daily_activity("run")]);
        let summary = service.day_summary(date(2024, 1, 1)).unwrap();
        assert_eq!(summary.total_min, 0);
        assert_eq!(summary.completion, 0.0);
    }

    #[test]
    fn history_records_compositions_and_plans() {
        let (service, _, _) = service_with(vec![daily_activity("run")]);
        service.compose_plans(date(2024, 5, 10)).unwrap();
        let events = service.history();
        let plan_events = events
            .iter()
            .filter(|event| matches!(event, HistoryEvent::PlanCreated { .. }))
            .count();
        assert_eq!(plan_events, 4);
        assert!(events
            .iter()
            .any(|event| matches!(event, HistoryEvent::RangeComposed { .. })));
    }
}
