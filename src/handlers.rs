pub mod budgets;
pub mod categories;
pub mod entries;
pub mod export;
pub mod health;
pub mod users;
