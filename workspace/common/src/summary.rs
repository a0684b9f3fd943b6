use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Derived, read-only figures of a budget period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BudgetSummary {
    /// Sum of all active incomes and expenses (expenses are negative)
    pub overall_balance: Decimal,
    /// Days left until the end of the period, never negative
    pub remaining_days: i64,
    /// Goal minus overall balance
    pub distance_from_target: Decimal,
}
