//! Validation rules for budget periods.
//!
//! A user's active periods must never overlap, and a period can only be
//! reshaped while every active entry still fits inside it.

use chrono::NaiveDate;
use model::entities::{budget, ledger_entry};
use sea_orm::{ColumnTrait, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, warn};

use crate::error::{ComputeError, Result};

/// Whether two inclusive date ranges share at least one day.
pub fn ranges_overlap(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        return Err(ComputeError::InvalidDateRange { from, to });
    }
    Ok(())
}

/// Rejects `[from, to]` if it intersects another active period of `owner_id`.
///
/// `exclude` is the id of the budget being updated, which may of course
/// overlap its own previous range.
#[instrument(skip(db))]
pub async fn ensure_no_overlap<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    from: NaiveDate,
    to: NaiveDate,
    exclude: Option<i32>,
) -> Result<()> {
    validate_range(from, to)?;

    let mut query = budget::Entity::find_active()
        .filter(budget::Column::OwnerId.eq(owner_id))
        .filter(budget::Column::FromDate.lte(to))
        .filter(budget::Column::ToDate.gte(from));
    if let Some(id) = exclude {
        query = query.filter(budget::Column::Id.ne(id));
    }

    match query.order_by_asc(budget::Column::FromDate).one(db).await? {
        Some(conflict) => {
            warn!(
                "Budget period {} - {} for user {} overlaps budget {}",
                from, to, owner_id, conflict.id
            );
            Err(ComputeError::OverlappingBudget {
                from,
                to,
                conflicting_id: conflict.id,
                conflicting_purpose: conflict.purpose,
                conflicting_from: conflict.from_date,
                conflicting_to: conflict.to_date,
            })
        }
        None => {
            debug!("No overlapping budget for user {} in {} - {}", owner_id, from, to);
            Ok(())
        }
    }
}

/// Rejects a new range for `budget_id` that would leave active entries outside it.
pub async fn ensure_entries_within<C: ConnectionTrait>(
    db: &C,
    budget_id: i32,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<()> {
    let stranded = ledger_entry::Entity::find_active_in_budget(budget_id, None)
        .filter(
            ledger_entry::Column::Date
                .lt(from)
                .or(ledger_entry::Column::Date.gt(to)),
        )
        .count(db)
        .await?;

    if stranded > 0 {
        return Err(ComputeError::EntriesOutsideBudget {
            count: stranded,
            from,
            to,
        });
    }
    Ok(())
}
