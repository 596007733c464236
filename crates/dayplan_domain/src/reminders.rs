use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub occurrence_id: String,
    pub title: String,
    pub body: String,
    pub remind_on: NaiveDate,
}

/// Platform-specific reminder adapters will implement this trait. The
/// core only decides which occurrences deserve a reminder; delivery is
/// the host's concern.
pub trait ReminderSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
    fn cancel_for_occurrence(&self, occurrence_id: &str);
}
