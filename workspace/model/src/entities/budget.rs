use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;
use sea_orm::Set;
use tracing::debug;

use crate::soft_delete::{Lifecycle, SoftDelete};

/// A budgeting period: a date range owned by one user with a goal amount.
///
/// Periods of the same user never overlap while active; that rule is
/// enforced by the compute crate before anything is written.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub purpose: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub goal: Decimal,
    /// First day of the period (inclusive).
    pub from_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub to_date: NaiveDate,
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
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntry,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Model {
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_columns(self.deleted_at, self.deleted_by)
    }
}

impl Entity {
    /// Budgets that have not been soft-deleted.
    pub fn find_active() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    /// Active budgets of one user, newest first.
    pub fn find_active_owned(owner_id: i32) -> Select<Entity> {
        Self::find_active()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
    }

    /// Active budgets whose range contains `date`.
    pub fn find_active_containing(date: NaiveDate) -> Select<Entity> {
        Self::find_active()
            .filter(Column::FromDate.lte(date))
            .filter(Column::ToDate.gte(date))
    }
}

impl Model {
    /// Whether `date` falls inside this period, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }

    /// Marks the budget deleted by `actor` at `at`.
    pub async fn soft_delete<C: ConnectionTrait>(
        self,
        db: &C,
        actor: i32,
        at: NaiveDateTime,
    ) -> Result<Model, DbErr> {
        debug!("Soft-deleting budget {} on behalf of user {}", self.id, actor);
        let mut budget: ActiveModel = self.into();
        budget.deleted_at = Set(Some(at));
        budget.deleted_by = Set(Some(actor));
        budget.update(db).await
    }
}
