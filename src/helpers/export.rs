//! CSV rendering of a budget, its summary and its entries.

use chrono::NaiveDate;
use common::BudgetSummary;
use model::entities::budget;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// One income or expense line of the export.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub source: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Category label, if the entry has one.
    pub category: Option<String>,
}

const ENTRY_HEADER: [&str; 4] = ["Source", "Amount", "Date", "Category"];

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// Attachment name for the export of `budget_id`.
pub fn export_filename(budget_id: i32) -> String {
    format!("budget_{}.csv", budget_id)
}

/// Renders the export document.
///
/// Entries are written in the order given; callers sort them by date.
pub fn render_budget_csv(
    budget: &budget::Model,
    summary: &BudgetSummary,
    incomes: &[ExportEntry],
    expenses: &[ExportEntry],
) -> Result<Vec<u8>, ExportError> {
    let mut writer = block_writer(Vec::new());

    writer.write_record(["Budget", budget.purpose.as_str()])?;
    writer.write_record(["Goal".to_string(), money(budget.goal)])?;
    writer.write_record(["From Date".to_string(), budget.from_date.to_string()])?;
    writer.write_record(["To Date".to_string(), budget.to_date.to_string()])?;
    writer.write_record(["Overall Balance".to_string(), money(summary.overall_balance)])?;
    writer.write_record(["Remaining Days".to_string(), summary.remaining_days.to_string()])?;
    writer.write_record([
        "Distance from Target".to_string(),
        money(summary.distance_from_target),
    ])?;
    let mut out = finish(writer)?;

    for (title, entries) in [("Incomes", incomes), ("Expenses", expenses)] {
        // csv has no empty record, so the separating line is written between writers.
        out.push(b'\n');
        let mut writer = block_writer(out);
        writer.write_record([title])?;
        writer.write_record(ENTRY_HEADER)?;
        for entry in entries {
            writer.write_record([
                entry.source.clone(),
                money(entry.amount),
                entry.date.to_string(),
                entry.category.clone().unwrap_or_default(),
            ])?;
        }
        out = finish(writer)?;
    }

    Ok(out)
}

fn block_writer(out: Vec<u8>) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

fn finish(mut writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> budget::Model {
        budget::Model {
            id: 7,
            owner_id: 1,
            purpose: "January, at home".to_string(),
            goal: Decimal::new(15000000, 4),
            from_date: date(2024, 1, 1),
            to_date: date(2024, 1, 31),
            created_at: date(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap(),
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_render_budget_csv_layout() {
        let summary = BudgetSummary {
            overall_balance: Decimal::new(80000, 2),
            remaining_days: 10,
            distance_from_target: Decimal::new(70000, 2),
        };
        let incomes = vec![ExportEntry {
            source: "Salary".to_string(),
            amount: Decimal::new(100000, 2),
            date: date(2024, 1, 5),
            category: None,
        }];
        let expenses = vec![ExportEntry {
            source: "Groceries".to_string(),
            amount: Decimal::new(-2000000, 4),
            date: date(2024, 1, 9),
            category: Some("Food".to_string()),
        }];

        let rendered = render_budget_csv(&january(), &summary, &incomes, &expenses).unwrap();

        let expected = "\
Budget,\"January, at home\"
Goal,1500.00
From Date,2024-01-01
To Date,2024-01-31
Overall Balance,800.00
Remaining Days,10
Distance from Target,700.00

Incomes
Source,Amount,Date,Category
Salary,1000.00,2024-01-05,

Expenses
Source,Amount,Date,Category
Groceries,-200.00,2024-01-09,Food
";
        assert_eq!(String::from_utf8(rendered).unwrap(), expected);
    }

    #[test]
    fn test_empty_sections_keep_headers() {
        let summary = BudgetSummary {
            overall_balance: Decimal::ZERO,
            remaining_days: 0,
            distance_from_target: Decimal::new(1500, 0),
        };

        let rendered = String::from_utf8(render_budget_csv(&january(), &summary, &[], &[]).unwrap()).unwrap();

        assert!(rendered.ends_with("\nIncomes\nSource,Amount,Date,Category\n\nExpenses\nSource,Amount,Date,Category\n"));
        assert!(rendered.contains("Overall Balance,0.00\n"));
        assert_eq!(export_filename(7), "budget_7.csv");
    }

    #[test]
    fn test_sections_are_separated_by_exactly_one_blank_line() {
        let summary = BudgetSummary {
            overall_balance: Decimal::new(5050, 2),
            remaining_days: 3,
            distance_from_target: Decimal::new(144950, 2),
        };
        let incomes = vec![ExportEntry {
            source: "Bonus".to_string(),
            amount: Decimal::new(505, 1),
            date: date(2024, 1, 2),
            category: None,
        }];

        let rendered = String::from_utf8(render_budget_csv(&january(), &summary, &incomes, &[]).unwrap()).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.iter().filter(|l| l.is_empty()).count(), 2);
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "Incomes");
        assert_eq!(lines[10], "Bonus,50.50,2024-01-02,");
        assert_eq!(lines[11], "");
        assert_eq!(lines[12], "Expenses");
        assert!(!rendered.contains("\"\""));
    }
}
