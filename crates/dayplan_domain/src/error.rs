use chrono::NaiveDate;
use thiserror::Error;

/// Failures the core can surface to callers. Empty or inverted ranges are
/// not part of this taxonomy: composition recovers from those locally by
/// producing an empty result.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("calendar arithmetic failed near {anchor} (shift {shift})")]
    DateArithmetic { anchor: NaiveDate, shift: i32 },

    #[error("activity catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
