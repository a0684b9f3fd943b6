use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::FirstName))
                    .col(string(Users::LastName))
                    .col(string(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(date_time(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create budgets table
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(pk_auto(Budgets::Id))
                    .col(integer(Budgets::OwnerId))
                    .col(string(Budgets::Purpose))
                    .col(decimal_len(Budgets::Goal, 16, 4))
                    .col(date(Budgets::FromDate))
                    .col(date(Budgets::ToDate))
                    .col(date_time(Budgets::CreatedAt))
                    .col(date_time_null(Budgets::DeletedAt))
                    .col(integer_null(Budgets::DeletedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_owner")
                            .from(Budgets::Table, Budgets::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_owner_id")
                    .table(Budgets::Table)
                    .col(Budgets::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(integer(Categories::OwnerId))
                    .col(string(Categories::Label))
                    .col(decimal_len(Categories::BudgetedAmount, 16, 4))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_owner")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create ledger_entries table (incomes and expenses)
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(pk_auto(LedgerEntries::Id))
                    .col(integer(LedgerEntries::OwnerId))
                    .col(integer(LedgerEntries::BudgetId))
                    .col(string_len(LedgerEntries::Kind, 16))
                    .col(string(LedgerEntries::Source))
                    .col(decimal_len(LedgerEntries::Amount, 16, 4))
                    .col(date(LedgerEntries::Date))
                    .col(integer_null(LedgerEntries::CategoryId))
                    .col(boolean(LedgerEntries::IsRecurrent).default(false))
                    .col(string_len(LedgerEntries::Recurrence, 16).default("one_off"))
                    .col(integer(LedgerEntries::Frequency).default(1))
                    .col(integer_null(LedgerEntries::ParentId))
                    .col(date_time(LedgerEntries::CreatedAt))
                    .col(date_time_null(LedgerEntries::DeletedAt))
                    .col(integer_null(LedgerEntries::DeletedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entry_owner")
                            .from(LedgerEntries::Table, LedgerEntries::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entry_budget")
                            .from(LedgerEntries::Table, LedgerEntries::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entry_category")
                            .from(LedgerEntries::Table, LedgerEntries::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entry_parent")
                            .from(LedgerEntries::Table, LedgerEntries::ParentId)
                            .to(LedgerEntries::Table, LedgerEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_budget_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::BudgetId)
                    .to_owned(),
            )
            .await?;

        // Parent -> children lookups during re-materialization
        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_parent_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ParentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    OwnerId,
    Purpose,
    Goal,
    FromDate,
    ToDate,
    CreatedAt,
    DeletedAt,
    DeletedBy,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    OwnerId,
    Label,
    BudgetedAmount,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    OwnerId,
    BudgetId,
    Kind,
    Source,
    Amount,
    Date,
    CategoryId,
    IsRecurrent,
    Recurrence,
    Frequency,
    ParentId,
    CreatedAt,
    DeletedAt,
    DeletedBy,
}
