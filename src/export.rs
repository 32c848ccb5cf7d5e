// CSV export and import
// Column layout: Date,Category,Amount,Note — quoting is the csv crate's job.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::categories::Category;
use crate::db::{Expense, NewExpense};

/// CSV row shape shared by export and import
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,

    #[serde(rename = "Category")]
    category: Category,

    #[serde(rename = "Amount")]
    amount: f64,

    #[serde(rename = "Note")]
    note: String,
}

/// Write expenses as CSV. Exporting an empty set is an error so callers can
/// tell the user instead of producing a header-only file.
pub fn export_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize> {
    if expenses.is_empty() {
        bail!("No expenses to export");
    }

    let mut wtr = csv::Writer::from_writer(writer);

    for expense in expenses {
        wtr.serialize(CsvRecord {
            date: expense.date,
            category: expense.category.clone(),
            amount: expense.amount,
            note: expense.note.clone(),
        })
        .context("Failed to write CSV record")?;
    }

    wtr.flush()?;
    Ok(expenses.len())
}

/// Export to a string (used by the API's download endpoint)
pub fn export_csv_string(expenses: &[Expense]) -> Result<String> {
    let mut buf = Vec::new();
    export_csv(expenses, &mut buf)?;
    String::from_utf8(buf).context("Exported CSV was not valid UTF-8")
}

/// Export to a file path
pub fn export_csv_to_path(expenses: &[Expense], path: &Path) -> Result<usize> {
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV file {:?}", path))?;
    let written = export_csv(expenses, file)?;
    log::info!("exported {} expenses to {:?}", written, path);
    Ok(written)
}

/// Default export filename, e.g. `expenses_2026-08-07.csv`
pub fn default_export_filename(today: NaiveDate) -> String {
    format!("expenses_{}.csv", today)
}

/// Read expenses from CSV. Every row is validated; the first bad row aborts
/// the import with its line number.
pub fn import_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut imported = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        // Header is line 1, first record line 2
        let line = index + 2;

        let record: CsvRecord =
            result.with_context(|| format!("Failed to parse CSV line {}", line))?;

        let expense = NewExpense {
            amount: record.amount,
            category: record.category,
            date: record.date,
            note: record.note,
        };

        if let Err(errors) = expense.validate() {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            bail!("Invalid expense on CSV line {}: {}", line, joined);
        }

        imported.push(expense);
    }

    Ok(imported)
}

/// Import from a file path
pub fn import_csv_from_path(path: &Path) -> Result<Vec<NewExpense>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file {:?}", path))?;
    import_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn expense(id: i64, amount: f64, category: Category, day: &str, note: &str) -> Expense {
        Expense {
            id,
            amount,
            category,
            date: date(day),
            note: note.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_export_layout() {
        let expenses = vec![
            expense(1, 120.5, Category::Food, "2026-08-01", "team lunch"),
            expense(2, 40.0, Category::Travel, "2026-08-02", ""),
        ];

        let csv = export_csv_string(&expenses).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("Date,Category,Amount,Note"));
        assert_eq!(lines.next(), Some("2026-08-01,Food,120.5,team lunch"));
        assert_eq!(lines.next(), Some("2026-08-02,Travel,40.0,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_quotes_notes() {
        let expenses = vec![expense(
            1,
            10.0,
            Category::Food,
            "2026-08-01",
            "coffee, \"extra\" shot",
        )];

        let csv = export_csv_string(&expenses).unwrap();
        assert!(csv.contains("\"coffee, \"\"extra\"\" shot\""));
    }

    #[test]
    fn test_export_empty_is_error() {
        assert!(export_csv_string(&[]).is_err());
    }

    #[test]
    fn test_import_round_trip() {
        let expenses = vec![
            expense(1, 120.5, Category::Food, "2026-08-01", "team lunch"),
            expense(2, 75.0, Category::Custom("Pets".to_string()), "2026-08-02", ""),
        ];

        let csv = export_csv_string(&expenses).unwrap();
        let imported = import_csv(csv.as_bytes()).unwrap();

        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].amount, 120.5);
        assert_eq!(imported[0].category, Category::Food);
        assert_eq!(imported[0].note, "team lunch");
        assert_eq!(imported[1].category, Category::Custom("Pets".to_string()));
    }

    #[test]
    fn test_import_rejects_bad_amount() {
        let csv = "Date,Category,Amount,Note\n2026-08-01,Food,-5.0,oops\n";

        let err = import_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_import_rejects_unparseable_row() {
        let csv = "Date,Category,Amount,Note\nnot-a-date,Food,5.0,x\n";

        assert!(import_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(
            default_export_filename(date("2026-08-07")),
            "expenses_2026-08-07.csv"
        );
    }
}
