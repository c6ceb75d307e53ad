// ⚠️ Core Errors - typed failures of the calendar utilities
// Everything above the core (db, collector, export) reports through anyhow.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// A date string matched none of the accepted layouts
    #[error("unrecognized date format: {0:?}")]
    Format(String),

    #[error("month must be within 1..=12, got {0}")]
    InvalidMonth(u32),

    /// Valid month, but the year is outside what chrono can represent
    #[error("date out of supported range: {year}-{month:02}")]
    OutOfRange { year: i32, month: u32 },
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
