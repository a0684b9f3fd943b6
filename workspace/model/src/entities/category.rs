use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

/// A user-defined label for ledger entries, with the amount the user plans
/// to spend (or earn) under it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    pub label: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub budgeted_amount: Decimal,
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

impl Entity {
    /// Categories belonging to `owner_id`, alphabetically.
    pub fn find_owned(owner_id: i32) -> Select<Entity> {
        Self::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_asc(Column::Label)
    }
}
