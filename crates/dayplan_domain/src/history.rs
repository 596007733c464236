use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::DateRange;
use crate::plan::PeriodKind;

/// What the service did, kept for diagnostics and recent-activity views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum HistoryEvent {
    RangeComposed {
        range: DateRange,
        days: usize,
    },
    PlanCreated {
        kind: PeriodKind,
        range: DateRange,
    },
    OccurrenceAdvanced {
        occurrence_id: String,
        from: NaiveDate,
        to: NaiveDate,
    },
}

/// Bounded in-memory event log. Explicitly injected into the service and
/// capacity-capped; the oldest entries fall off the front.
#[derive(Debug)]
pub struct HistoryLog {
    capacity: usize,
    entries: VecDeque<HistoryEvent>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn record(&mut self, event: HistoryEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
