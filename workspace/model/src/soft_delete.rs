//! Tombstone handling for records that are never hard-deleted.
//!
//! Budgets and ledger entries keep a `deleted_at` timestamp and the id of the
//! user who deleted them. Instead of checking those columns ad hoc, callers
//! ask a record for its [`Lifecycle`].

use chrono::NaiveDateTime;

/// Whether a soft-deletable record is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted {
        at: NaiveDateTime,
        by: Option<i32>,
    },
}

impl Lifecycle {
    /// Builds the state from the `deleted_at` / `deleted_by` column pair.
    pub fn from_columns(deleted_at: Option<NaiveDateTime>, deleted_by: Option<i32>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at, by: deleted_by },
            None => Lifecycle::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}

/// Implemented by models that carry tombstone columns.
pub trait SoftDelete {
    fn lifecycle(&self) -> Lifecycle;

    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }
}
