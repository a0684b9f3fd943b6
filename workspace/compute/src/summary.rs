use chrono::NaiveDate;
use common::BudgetSummary;
use model::SoftDelete;
use model::entities::{budget, ledger_entry};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument};

use crate::error::Result;

/// Days from `today` until the end of the period, floored at zero.
pub fn remaining_days(budget: &budget::Model, today: NaiveDate) -> i64 {
    budget.to_date.signed_duration_since(today).num_days().max(0)
}

/// Computes the derived figures of `budget` from its entries.
///
/// Deleted entries and entries of other budgets are ignored, so callers may
/// pass an unfiltered slice.
pub fn summarize(
    budget: &budget::Model,
    entries: &[ledger_entry::Model],
    today: NaiveDate,
) -> BudgetSummary {
    let overall_balance: Decimal = entries
        .iter()
        .filter(|entry| entry.budget_id == budget.id && entry.is_active())
        .map(|entry| entry.amount)
        .sum();

    BudgetSummary {
        overall_balance,
        remaining_days: remaining_days(budget, today),
        distance_from_target: budget.goal - overall_balance,
    }
}

/// Loads the active entries of `budget` and summarizes them.
#[instrument(skip(db, budget), fields(budget_id = budget.id))]
pub async fn compute_summary<C: ConnectionTrait>(
    db: &C,
    budget: &budget::Model,
    today: NaiveDate,
) -> Result<BudgetSummary> {
    let entries = ledger_entry::Entity::find_active_in_budget(budget.id, None)
        .all(db)
        .await?;
    debug!("Summarizing {} entries", entries.len());
    Ok(summarize(budget, &entries, today))
}
