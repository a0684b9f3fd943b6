//! Materialization of recurring ledger entries.
//!
//! A recurring entry is the first occurrence of a series of `frequency`
//! occurrences. Every later occurrence is stored as its own one-off entry
//! whose `parent_id` points back to the recurring entry, so that balances
//! and listings only ever deal with concrete rows.
//!
//! Occurrences that fall after the end of the entry's budget are moved to
//! whichever active budget contains their date. When no budget contains it
//! the occurrence is dropped. Which budgets are searched is controlled by
//! [`OverflowScope`].

use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use model::entities::ledger_entry::RecurrencePeriod;
use model::entities::{budget, ledger_entry};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, trace};

use crate::error::{ComputeError, Result};

/// Which budgets may receive occurrences that overflow the entry's own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowScope {
    /// Only budgets owned by the entry's owner.
    #[default]
    SameOwner,
    /// Any user's budget. Occurrences can end up in a stranger's budget;
    /// kept for compatibility with data created under that rule.
    ///
    /// Such an occurrence stays owned by the user who saved the recurring
    /// entry. It shows up in the host budget's entry listing and summary,
    /// but the host budget's owner cannot fetch, edit or delete it (404).
    AnyOwner,
}

impl FromStr for OverflowScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "same_owner" => Ok(OverflowScope::SameOwner),
            "any_owner" => Ok(OverflowScope::AnyOwner),
            other => Err(format!(
                "unknown overflow scope '{}', expected 'same_owner' or 'any_owner'",
                other
            )),
        }
    }
}

impl fmt::Display for OverflowScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowScope::SameOwner => f.write_str("same_owner"),
            OverflowScope::AnyOwner => f.write_str("any_owner"),
        }
    }
}

/// Advances `date` by one recurrence step.
///
/// Month and year steps keep the day of month when it exists and clamp to
/// the last day of the target month otherwise (Jan 31 -> Feb 29 in a leap
/// year). Returns `None` for one-off entries and when the calendar overflows.
pub fn step(period: RecurrencePeriod, date: NaiveDate) -> Option<NaiveDate> {
    match period {
        RecurrencePeriod::OneOff => None,
        RecurrencePeriod::Daily => date.checked_add_days(Days::new(1)),
        RecurrencePeriod::Weekly => date.checked_add_days(Days::new(7)),
        RecurrencePeriod::Monthly => date.checked_add_months(Months::new(1)),
        RecurrencePeriod::Yearly => date.checked_add_months(Months::new(12)),
    }
}

/// Dates of occurrences `2..=frequency`, each one step after the previous.
///
/// The anchor itself (occurrence 1) is not included.
pub fn occurrence_dates(
    anchor: NaiveDate,
    period: RecurrencePeriod,
    frequency: i32,
) -> Vec<(i32, NaiveDate)> {
    let mut dates = Vec::new();
    let mut current = anchor;
    for index in 2..=frequency {
        match step(period, current) {
            Some(next) => {
                dates.push((index, next));
                current = next;
            }
            None => break,
        }
    }
    dates
}

/// Source text of a generated occurrence, e.g. "Rent (2 of 12)".
pub fn occurrence_label(source: &str, index: i32, frequency: i32) -> String {
    format!("{} ({} of {})", source, index, frequency)
}

/// Outcome of materializing one recurring entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializationReport {
    /// Occurrences written to the database.
    pub created: Vec<ledger_entry::Model>,
    /// Dates for which no budget could be found.
    pub dropped: Vec<NaiveDate>,
    /// Previously generated occurrences that were soft-deleted.
    pub discarded: u64,
}

/// Regenerates the occurrences of `entry`.
///
/// Previously generated occurrences are always soft-deleted first, so
/// calling this for an entry that stopped being recurrent cleans up its
/// series. The caller is expected to run this inside a transaction when
/// partial results must not survive a failure.
#[instrument(skip(db, entry), fields(entry_id = entry.id))]
pub async fn materialize<C: ConnectionTrait>(
    db: &C,
    entry: &ledger_entry::Model,
    actor: i32,
    scope: OverflowScope,
    now: NaiveDateTime,
) -> Result<MaterializationReport> {
    let mut report = MaterializationReport {
        discarded: discard_occurrences(db, entry.id, actor, now).await?,
        ..Default::default()
    };
    debug!("Discarded {} previous occurrences", report.discarded);

    if !entry.is_recurrent || entry.frequency <= 1 {
        trace!("Entry is not recurrent, nothing to generate");
        return Ok(report);
    }

    let home = budget::Entity::find_by_id(entry.budget_id)
        .one(db)
        .await?
        .ok_or(ComputeError::NotFound {
            entity: "Budget",
            id: entry.budget_id,
        })?;

    for (index, date) in occurrence_dates(entry.date, entry.recurrence, entry.frequency) {
        let target = if home.contains(date) {
            Some(home.id)
        } else {
            find_overflow_budget(db, entry.owner_id, date, scope)
                .await?
                .map(|budget| budget.id)
        };

        let Some(budget_id) = target else {
            debug!("No budget contains {}, dropping occurrence {}", date, index);
            report.dropped.push(date);
            continue;
        };

        let child = ledger_entry::ActiveModel {
            owner_id: Set(entry.owner_id),
            budget_id: Set(budget_id),
            kind: Set(entry.kind),
            source: Set(occurrence_label(&entry.source, index, entry.frequency)),
            amount: Set(entry.amount),
            date: Set(date),
            category_id: Set(entry.category_id),
            is_recurrent: Set(false),
            recurrence: Set(RecurrencePeriod::OneOff),
            frequency: Set(1),
            parent_id: Set(Some(entry.id)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        trace!("Created occurrence {} on {} in budget {}", child.id, date, budget_id);
        report.created.push(child);
    }

    info!(
        "Materialized entry {}: {} created, {} dropped",
        entry.id,
        report.created.len(),
        report.dropped.len()
    );
    Ok(report)
}

/// Totals of a budget-wide reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub entries: usize,
    pub created: usize,
    pub dropped: usize,
    pub discarded: u64,
}

/// Re-materializes every active top-level recurring entry of a budget.
#[instrument(skip(db))]
pub async fn reload_budget<C: ConnectionTrait>(
    db: &C,
    budget_id: i32,
    actor: i32,
    scope: OverflowScope,
    now: NaiveDateTime,
) -> Result<ReloadReport> {
    let recurring = ledger_entry::Entity::find_active_in_budget(budget_id, None)
        .filter(ledger_entry::Column::IsRecurrent.eq(true))
        .filter(ledger_entry::Column::ParentId.is_null())
        .order_by_asc(ledger_entry::Column::Date)
        .order_by_asc(ledger_entry::Column::Id)
        .all(db)
        .await?;

    let mut totals = ReloadReport {
        entries: recurring.len(),
        ..Default::default()
    };
    for entry in &recurring {
        let report = materialize(db, entry, actor, scope, now).await?;
        totals.created += report.created.len();
        totals.dropped += report.dropped.len();
        totals.discarded += report.discarded;
    }

    info!(
        "Reloaded {} recurring entries of budget {}",
        totals.entries, budget_id
    );
    Ok(totals)
}

/// Soft-deletes the active occurrences generated from `parent_id`.
pub async fn discard_occurrences<C: ConnectionTrait>(
    db: &C,
    parent_id: i32,
    actor: i32,
    now: NaiveDateTime,
) -> Result<u64> {
    let result = ledger_entry::Entity::update_many()
        .col_expr(ledger_entry::Column::DeletedAt, Expr::value(now))
        .col_expr(ledger_entry::Column::DeletedBy, Expr::value(actor))
        .filter(ledger_entry::Column::ParentId.eq(parent_id))
        .filter(ledger_entry::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn find_overflow_budget<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    date: NaiveDate,
    scope: OverflowScope,
) -> Result<Option<budget::Model>> {
    let mut query = budget::Entity::find_active_containing(date);
    if scope == OverflowScope::SameOwner {
        query = query.filter(budget::Column::OwnerId.eq(owner_id));
    }
    Ok(query.order_by_asc(budget::Column::Id).one(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_budget, create_entry, create_user, date, now, setup_db};
    use model::SoftDelete;
    use model::entities::ledger_entry::EntryKind;
    use rust_decimal::Decimal;

    #[test]
    fn test_step_per_period() {
        let anchor = date(2024, 1, 31);

        assert_eq!(step(RecurrencePeriod::Daily, anchor), Some(date(2024, 2, 1)));
        assert_eq!(step(RecurrencePeriod::Weekly, anchor), Some(date(2024, 2, 7)));
        assert_eq!(step(RecurrencePeriod::Monthly, anchor), Some(date(2024, 2, 29)));
        assert_eq!(step(RecurrencePeriod::Yearly, date(2024, 2, 29)), Some(date(2025, 2, 28)));
        assert_eq!(step(RecurrencePeriod::OneOff, anchor), None);
    }

    #[test]
    fn test_monthly_occurrences_chain_from_previous_date() {
        let dates = occurrence_dates(date(2024, 1, 15), RecurrencePeriod::Monthly, 3);
        assert_eq!(dates, vec![(2, date(2024, 2, 15)), (3, date(2024, 3, 15))]);

        // Clamping carries over: each step starts from the clamped date
        let dates = occurrence_dates(date(2024, 1, 31), RecurrencePeriod::Monthly, 3);
        assert_eq!(dates, vec![(2, date(2024, 2, 29)), (3, date(2024, 3, 29))]);
    }

    #[test]
    fn test_no_occurrences_for_single_frequency_or_one_off() {
        assert!(occurrence_dates(date(2024, 1, 15), RecurrencePeriod::Weekly, 1).is_empty());
        assert!(occurrence_dates(date(2024, 1, 15), RecurrencePeriod::Weekly, 0).is_empty());
        assert!(occurrence_dates(date(2024, 1, 15), RecurrencePeriod::OneOff, 5).is_empty());
    }

    #[test]
    fn test_occurrence_label() {
        assert_eq!(occurrence_label("Rent", 2, 3), "Rent (2 of 3)");
    }

    #[test]
    fn test_overflow_scope_parsing() {
        assert_eq!("same_owner".parse::<OverflowScope>(), Ok(OverflowScope::SameOwner));
        assert_eq!(" ANY_OWNER ".parse::<OverflowScope>(), Ok(OverflowScope::AnyOwner));
        assert!("everyone".parse::<OverflowScope>().is_err());
        assert_eq!(OverflowScope::default().to_string(), "same_owner");
    }

    #[tokio::test]
    async fn test_monthly_series_within_budget() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let quarter = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 3, 31), Decimal::ZERO).await;
        let salary = create_entry(
            &db,
            &quarter,
            EntryKind::Income,
            Decimal::new(100000, 2),
            date(2024, 1, 15),
            Some((RecurrencePeriod::Monthly, 3)),
        )
        .await;

        let report = materialize(&db, &salary, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        assert_eq!(report.discarded, 0);
        assert!(report.dropped.is_empty());
        assert_eq!(report.created.len(), 2);

        let second = &report.created[0];
        assert_eq!(second.date, date(2024, 2, 15));
        assert_eq!(second.source, "Salary (2 of 3)");
        assert_eq!(second.amount, Decimal::new(100000, 2));
        assert_eq!(second.parent_id, Some(salary.id));
        assert_eq!(second.budget_id, quarter.id);
        assert_eq!(second.recurrence, RecurrencePeriod::OneOff);
        assert!(!second.is_recurrent);

        let third = &report.created[1];
        assert_eq!(third.date, date(2024, 3, 15));
        assert_eq!(third.source, "Salary (3 of 3)");
    }

    #[tokio::test]
    async fn test_rerun_discards_previous_children() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let january = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 1, 31), Decimal::ZERO).await;
        let coffee = create_entry(
            &db,
            &january,
            EntryKind::Expense,
            Decimal::new(-350, 2),
            date(2024, 1, 1),
            Some((RecurrencePeriod::Weekly, 4)),
        )
        .await;

        let first = materialize(&db, &coffee, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();
        let second = materialize(&db, &coffee, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        assert_eq!(first.created.len(), 3);
        assert_eq!(second.discarded, 3);
        assert_eq!(second.created.len(), 3);

        // Same final set of dates, new identities
        let active = ledger_entry::Entity::find_active_children(coffee.id)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.iter().all(|c| !first.created.iter().any(|f| f.id == c.id)));

        let stale = ledger_entry::Entity::find_by_id(first.created[0].id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(!stale.is_active());
        assert_eq!(stale.deleted_by, Some(alice.id));
    }

    #[tokio::test]
    async fn test_non_recurrent_entry_only_cleans_up() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let january = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 1, 31), Decimal::ZERO).await;
        let gym = create_entry(
            &db,
            &january,
            EntryKind::Expense,
            Decimal::new(-4000, 2),
            date(2024, 1, 2),
            Some((RecurrencePeriod::Weekly, 3)),
        )
        .await;
        materialize(&db, &gym, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        // The user switches recurrence off
        let mut cancelled = gym.clone();
        cancelled.is_recurrent = false;
        let report = materialize(&db, &cancelled, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();
        assert_eq!(report.discarded, 2);
        assert!(report.created.is_empty());

        // Frequency of one never generates anything
        let once = create_entry(
            &db,
            &january,
            EntryKind::Income,
            Decimal::new(1000, 2),
            date(2024, 1, 3),
            Some((RecurrencePeriod::Daily, 1)),
        )
        .await;
        let report = materialize(&db, &once, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();
        assert_eq!(report, MaterializationReport::default());
    }

    #[tokio::test]
    async fn test_overflow_moves_to_next_budget_or_drops() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let january = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 1, 31), Decimal::ZERO).await;
        let february = create_budget(&db, alice.id, date(2024, 2, 1), date(2024, 2, 29), Decimal::ZERO).await;
        let rent = create_entry(
            &db,
            &january,
            EntryKind::Expense,
            Decimal::new(-90000, 2),
            date(2024, 1, 15),
            Some((RecurrencePeriod::Monthly, 3)),
        )
        .await;

        let report = materialize(&db, &rent, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].budget_id, february.id);
        assert_eq!(report.created[0].date, date(2024, 2, 15));
        // Nobody covers March
        assert_eq!(report.dropped, vec![date(2024, 3, 15)]);
    }

    #[tokio::test]
    async fn test_overflow_scope_controls_foreign_budgets() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let bob = create_user(&db, "bob").await;
        let january = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 1, 31), Decimal::ZERO).await;
        let bobs_february = create_budget(&db, bob.id, date(2024, 2, 1), date(2024, 2, 29), Decimal::ZERO).await;
        let rent = create_entry(
            &db,
            &january,
            EntryKind::Expense,
            Decimal::new(-90000, 2),
            date(2024, 1, 15),
            Some((RecurrencePeriod::Monthly, 2)),
        )
        .await;

        let scoped = materialize(&db, &rent, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();
        assert!(scoped.created.is_empty());
        assert_eq!(scoped.dropped, vec![date(2024, 2, 15)]);

        let global = materialize(&db, &rent, alice.id, OverflowScope::AnyOwner, now())
            .await
            .unwrap();
        assert_eq!(global.created.len(), 1);
        assert_eq!(global.created[0].budget_id, bobs_february.id);
        assert_eq!(global.created[0].owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_reload_budget_regenerates_every_series() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice").await;
        let january = create_budget(&db, alice.id, date(2024, 1, 1), date(2024, 1, 31), Decimal::ZERO).await;
        let daily = create_entry(
            &db,
            &january,
            EntryKind::Expense,
            Decimal::new(-500, 2),
            date(2024, 1, 1),
            Some((RecurrencePeriod::Daily, 5)),
        )
        .await;
        create_entry(
            &db,
            &january,
            EntryKind::Income,
            Decimal::new(2000, 2),
            date(2024, 1, 10),
            Some((RecurrencePeriod::Weekly, 2)),
        )
        .await;
        create_entry(&db, &january, EntryKind::Income, Decimal::new(100, 2), date(2024, 1, 2), None).await;
        materialize(&db, &daily, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        let totals = reload_budget(&db, january.id, alice.id, OverflowScope::SameOwner, now())
            .await
            .unwrap();

        assert_eq!(totals.entries, 2);
        assert_eq!(totals.created, 5);
        assert_eq!(totals.discarded, 4);
        assert_eq!(totals.dropped, 0);
    }
}
