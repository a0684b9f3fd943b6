//! Rules applied to a ledger entry before it is stored.

use chrono::NaiveDate;
use model::entities::budget;
use model::entities::ledger_entry::EntryKind;
use rust_decimal::Decimal;

use crate::error::{ComputeError, Result};

/// Applies the sign convention: expenses are stored negative, incomes as given.
pub fn normalize_amount(kind: EntryKind, amount: Decimal) -> Decimal {
    match kind {
        EntryKind::Expense if amount > Decimal::ZERO => -amount,
        _ => amount,
    }
}

pub fn ensure_date_within(budget: &budget::Model, date: NaiveDate) -> Result<()> {
    if !budget.contains(date) {
        return Err(ComputeError::DateOutsideBudget {
            date,
            from: budget.from_date,
            to: budget.to_date,
        });
    }
    Ok(())
}

pub fn ensure_valid_frequency(frequency: i32) -> Result<()> {
    if frequency < 1 {
        return Err(ComputeError::InvalidFrequency(frequency));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    fn january() -> budget::Model {
        budget::Model {
            id: 1,
            owner_id: 1,
            purpose: "January".to_string(),
            goal: Decimal::new(50000, 2),
            from_date: date(2024, 1, 1),
            to_date: date(2024, 1, 31),
            created_at: date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_expenses_become_negative() {
        assert_eq!(normalize_amount(EntryKind::Expense, Decimal::new(2000, 2)), Decimal::new(-2000, 2));
        assert_eq!(normalize_amount(EntryKind::Expense, Decimal::new(-2000, 2)), Decimal::new(-2000, 2));
        assert_eq!(normalize_amount(EntryKind::Income, Decimal::new(2000, 2)), Decimal::new(2000, 2));
    }

    #[test]
    fn test_entry_date_bounds_are_inclusive() {
        let budget = january();

        assert!(ensure_date_within(&budget, date(2024, 1, 1)).is_ok());
        assert!(ensure_date_within(&budget, date(2024, 1, 31)).is_ok());
        assert!(matches!(
            ensure_date_within(&budget, date(2024, 2, 1)),
            Err(ComputeError::DateOutsideBudget { .. })
        ));
        assert!(ensure_date_within(&budget, date(2023, 12, 31)).is_err());
    }

    #[test]
    fn test_frequency_must_be_positive() {
        assert!(ensure_valid_frequency(1).is_ok());
        assert!(matches!(ensure_valid_frequency(0), Err(ComputeError::InvalidFrequency(0))));
    }
}
