use chrono::NaiveDate;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A period whose start lies after its end
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// The proposed period intersects another active period of the same user
    #[error("Budget period {from} - {to} overlaps with budget '{conflicting_purpose}' ({conflicting_from} - {conflicting_to})")]
    OverlappingBudget {
        from: NaiveDate,
        to: NaiveDate,
        conflicting_id: i32,
        conflicting_purpose: String,
        conflicting_from: NaiveDate,
        conflicting_to: NaiveDate,
    },

    /// An entry dated outside its budget period
    #[error("Date {date} is outside the budget period {from} - {to}")]
    DateOutsideBudget {
        date: NaiveDate,
        from: NaiveDate,
        to: NaiveDate,
    },

    /// Shrinking a period would strand existing entries outside of it
    #[error("{count} entries would fall outside the budget period {from} - {to}")]
    EntriesOutsideBudget {
        count: u64,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("Frequency must be at least 1, got {0}")]
    InvalidFrequency(i32),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },
}

impl ComputeError {
    /// Whether the error was caused by the input rather than by storage.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ComputeError::Database(_) | ComputeError::NotFound { .. })
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
