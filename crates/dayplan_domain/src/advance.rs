use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::day::Day;

/// Relocation of one open occurrence from a stale day onto today.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccurrenceMove {
    pub occurrence_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Compute which occurrences must roll forward when `today` is evaluated.
///
/// An occurrence qualifies when its owning day precedes today, it is not
/// done, and its due date falls before today (unset counts as still
/// actionable). A due date on or after today is an explicit deferral and
/// stays put. Applying a move relocates the occurrence onto today's day
/// and advances its due date to today, which keeps repeated evaluations
/// of the same today idempotent; that side effect goes through the
/// `DayStore` boundary, this function only plans it.
pub fn overdue_moves(days: &[Day], today: NaiveDate) -> Vec<OccurrenceMove> {
    let mut moves = Vec::new();
    for day in days {
        if day.date >= today {
            continue;
        }
        for occurrence in &day.activities {
            if occurrence.is_done() {
                continue;
            }
            if occurrence.due_date.is_some_and(|due| due >= today) {
                continue;
            }
            moves.push(OccurrenceMove {
                occurrence_id: occurrence.id.clone(),
                from: day.date,
                to: today,
            });
        }
    }
    if !moves.is_empty() {
        debug!(count = moves.len(), %today, "planned overdue occurrence moves");
    }
    moves
}
