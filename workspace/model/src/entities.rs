//! This file serves as the root for all SeaORM entity modules.
//! Budgets, ledger entries and categories all belong to a user; ledger
//! entries additionally belong to a budget and optionally to a category.

pub mod budget;
pub mod category;
pub mod ledger_entry;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::category::Entity as Category;
    pub use super::ledger_entry::Entity as LedgerEntry;
    pub use super::user::Entity as User;
}
