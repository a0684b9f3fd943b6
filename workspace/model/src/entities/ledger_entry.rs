use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use tracing::debug;

use crate::soft_delete::{Lifecycle, SoftDelete};

/// Income or expense. Both share one table; expenses keep negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryKind {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Enum for recurrence periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RecurrencePeriod {
    #[sea_orm(string_value = "one_off")]
    OneOff,
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// A single income or expense recorded against a budget period.
///
/// A recurring entry (`is_recurrent`, `frequency > 1`) is the first
/// occurrence of a series; the remaining occurrences are materialized as
/// separate one-off rows pointing back to it through `parent_id`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub budget_id: i32,
    pub kind: EntryKind,
    pub source: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i32>,
    pub is_recurrent: bool,
    pub recurrence: RecurrencePeriod,
    /// Total number of occurrences, the entry itself included.
    pub frequency: i32,
    /// The recurring entry this occurrence was generated from.
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    Budget,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Model {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_columns(self.deleted_at, self.deleted_by)
    }
}

impl Entity {
    /// Entries that have not been soft-deleted.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    /// Active entries of a budget, optionally restricted to one kind.
    pub fn find_active_in_budget(budget_id: i32, kind: Option<EntryKind>) -> Select<Entity> {
        let query = Self::find_active().filter(Column::BudgetId.eq(budget_id));
        match kind {
            Some(kind) => query.filter(Column::Kind.eq(kind)),
            None => query,
        }
    }

    /// Active occurrences generated from the recurring entry `parent_id`.
    pub fn find_active_children(parent_id: i32) -> Select<Entity> {
        Self::find_active().filter(Column::ParentId.eq(parent_id))
    }
}

impl Model {
    /// Whether this row was generated from a recurring entry.
    pub fn is_generated(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Marks the entry deleted by `actor` at `at`.
    pub async fn soft_delete<C: ConnectionTrait>(
        self,
        db: &C,
        actor: i32,
        at: NaiveDateTime,
    ) -> Result<Model, DbErr> {
        debug!("Soft-deleting ledger entry {} on behalf of user {}", self.id, actor);
        let mut entry: ActiveModel = self.into();
        entry.deleted_at = Set(Some(at));
        entry.deleted_by = Set(Some(actor));
        entry.update(db).await
    }
}
