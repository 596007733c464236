pub mod activity;
pub mod advance;
pub mod compose;
pub mod day;
pub mod error;
pub mod frequency;
pub mod history;
pub mod period;
pub mod plan;
pub mod reminders;
pub mod service;
pub mod store;
pub mod streak;
pub mod summary;

pub use crate::error::DomainError;
pub use crate::service::{PlanService, PlanServiceBuilder};
