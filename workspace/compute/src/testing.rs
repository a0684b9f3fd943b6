//! Database fixtures shared by the compute tests.

use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use model::entities::ledger_entry::{EntryKind, RecurrencePeriod};
use model::entities::{budget, ledger_entry, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn now() -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(8, 0, 0).unwrap()
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(username.to_string()),
        last_name: Set("Tester".to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set("unused".to_string()),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn create_budget(
    db: &DatabaseConnection,
    owner_id: i32,
    from: NaiveDate,
    to: NaiveDate,
    goal: Decimal,
) -> budget::Model {
    budget::ActiveModel {
        owner_id: Set(owner_id),
        purpose: Set(format!("Budget {} - {}", from, to)),
        goal: Set(goal),
        from_date: Set(from),
        to_date: Set(to),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create budget")
}

/// Inserts an entry; `recurrence` of `None` makes it a plain one-off.
pub async fn create_entry(
    db: &DatabaseConnection,
    budget: &budget::Model,
    kind: EntryKind,
    amount: Decimal,
    on: NaiveDate,
    recurrence: Option<(RecurrencePeriod, i32)>,
) -> ledger_entry::Model {
    let (is_recurrent, period, frequency) = match recurrence {
        Some((period, frequency)) => (true, period, frequency),
        None => (false, RecurrencePeriod::OneOff, 1),
    };
    ledger_entry::ActiveModel {
        owner_id: Set(budget.owner_id),
        budget_id: Set(budget.id),
        kind: Set(kind),
        source: Set("Salary".to_string()),
        amount: Set(amount),
        date: Set(on),
        category_id: Set(None),
        is_recurrent: Set(is_recurrent),
        recurrence: Set(period),
        frequency: Set(frequency),
        parent_id: Set(None),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create ledger entry")
}
