use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::categories::Category;

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// Stored expense record.
///
/// `id` is assigned by SQLite on insert and never reused. `updated_at` is
/// `None` until the record is edited for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-supplied fields of an expense, used for both insert and update.
/// An update replaces all four fields at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
}

impl NewExpense {
    pub fn new(amount: f64, category: Category, date: NaiveDate, note: &str) -> Self {
        NewExpense {
            amount,
            category,
            date,
            note: note.to_string(),
        }
    }

    /// Validate the record invariants, collecting every violation
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.amount.is_finite() || self.amount <= 0.0 {
            errors.push(ValidationError {
                field: "amount".to_string(),
                message: format!("Amount must be greater than 0, got {}", self.amount),
            });
        }

        if self.category.name().is_empty() {
            errors.push(ValidationError {
                field: "category".to_string(),
                message: "Category is required".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn validation_failure(errors: Vec<ValidationError>) -> anyhow::Error {
    let joined = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    anyhow::anyhow!("invalid expense: {}", joined)
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// Open (creating if needed) the database at `path` and ensure the schema
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {:?}", path))?;
    setup_database(&conn)?;
    log::debug!("opened database at {:?}", path);
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    // Key/value settings (currency symbol and the like)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // Secondary indexes: date for range scans, category for filter queries,
    // amount for sorted views
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_amount ON expenses(amount)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CRUD
// ============================================================================

/// Insert a new expense, returning the assigned id
pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    expense.validate().map_err(validation_failure)?;

    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO expenses (amount, category, date, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            expense.amount,
            expense.category.name(),
            expense.date.to_string(),
            expense.note,
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Get a single expense by id
pub fn get_expense(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    let expense = conn
        .query_row(
            "SELECT id, amount, category, date, note, created_at, updated_at
             FROM expenses WHERE id = ?1",
            params![id],
            map_expense_row,
        )
        .optional()?;

    Ok(expense)
}

/// Get all expenses, newest date first
pub fn get_all_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, category, date, note, created_at, updated_at
         FROM expenses
         ORDER BY date DESC, id DESC",
    )?;

    let expenses = stmt
        .query_map([], map_expense_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

/// Replace all user fields of an expense and refresh `updated_at`.
/// Returns the updated record; fails if the id does not exist.
pub fn update_expense(conn: &Connection, id: i64, updates: &NewExpense) -> Result<Expense> {
    updates.validate().map_err(validation_failure)?;

    let updated_at = Utc::now();

    let changed = conn.execute(
        "UPDATE expenses
         SET amount = ?1, category = ?2, date = ?3, note = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            updates.amount,
            updates.category.name(),
            updates.date.to_string(),
            updates.note,
            updated_at.to_rfc3339(),
            id,
        ],
    )?;

    if changed == 0 {
        bail!("Expense {} not found", id);
    }

    get_expense(conn, id)?.with_context(|| format!("Expense {} vanished after update", id))
}

/// Delete a single expense; fails if the id does not exist
pub fn delete_expense(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;

    if changed == 0 {
        bail!("Expense {} not found", id);
    }

    Ok(())
}

/// Full wipe. Returns the number of records removed.
pub fn delete_all_expenses(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM expenses", [])?;
    log::info!("wiped {} expenses", removed);
    Ok(removed)
}

pub fn count_expenses(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// FILTER QUERIES
// ============================================================================

/// Expenses with `start <= date <= end`, newest first.
/// Dates are stored as `YYYY-MM-DD` text, so the comparison rides the index.
pub fn expenses_by_date_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, category, date, note, created_at, updated_at
         FROM expenses
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date DESC, id DESC",
    )?;

    let expenses = stmt
        .query_map(params![start.to_string(), end.to_string()], map_expense_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

/// Expenses in a single category, newest first
pub fn expenses_by_category(conn: &Connection, category: &Category) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, amount, category, date, note, created_at, updated_at
         FROM expenses
         WHERE category = ?1
         ORDER BY date DESC, id DESC",
    )?;

    let expenses = stmt
        .query_map(params![category.name()], map_expense_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

// ============================================================================
// SETTINGS
// ============================================================================

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn map_expense_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let category_name: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;
    let updated_at_str: Option<String> = row.get(6)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| rusqlite::Error::InvalidQuery)?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|_| rusqlite::Error::InvalidQuery)?
        .with_timezone(&Utc);

    let updated_at = updated_at_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: Category::parse(&category_name),
        date,
        note: row.get(4)?,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample(amount: f64, category: Category, day: &str, note: &str) -> NewExpense {
        NewExpense::new(amount, category, date(day), note)
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_conn();

        let id = insert_expense(
            &conn,
            &sample(120.50, Category::Food, "2026-08-01", "team lunch"),
        )
        .unwrap();

        let expense = get_expense(&conn, id).unwrap().unwrap();
        assert_eq!(expense.id, id);
        assert_eq!(expense.amount, 120.50);
        assert_eq!(expense.category, Category::Food);
        assert_eq!(expense.date, date("2026-08-01"));
        assert_eq!(expense.note, "team lunch");
        assert!(expense.updated_at.is_none());
    }

    #[test]
    fn test_ids_auto_increment() {
        let conn = test_conn();

        let first = insert_expense(&conn, &sample(10.0, Category::Food, "2026-08-01", "")).unwrap();
        let second =
            insert_expense(&conn, &sample(20.0, Category::Bills, "2026-08-02", "")).unwrap();

        assert!(second > first);
        assert_eq!(count_expenses(&conn).unwrap(), 2);
    }

    #[test]
    fn test_insert_rejects_non_positive_amount() {
        let conn = test_conn();

        let zero = sample(0.0, Category::Food, "2026-08-01", "");
        let negative = sample(-5.0, Category::Food, "2026-08-01", "");

        assert!(insert_expense(&conn, &zero).is_err());
        assert!(insert_expense(&conn, &negative).is_err());
        assert_eq!(count_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let bad = NewExpense::new(
            -1.0,
            Category::Custom(String::new()),
            date("2026-08-01"),
            "",
        );

        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "amount");
        assert_eq!(errors[1].field, "category");
    }

    #[test]
    fn test_update_replaces_fields_and_stamps() {
        let conn = test_conn();

        let id = insert_expense(&conn, &sample(45.0, Category::Food, "2026-08-01", "snack"))
            .unwrap();

        let updated = update_expense(
            &conn,
            id,
            &sample(300.0, Category::Travel, "2026-08-03", "cab fare"),
        )
        .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.amount, 300.0);
        assert_eq!(updated.category, Category::Travel);
        assert_eq!(updated.date, date("2026-08-03"));
        assert_eq!(updated.note, "cab fare");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_update_missing_id_fails() {
        let conn = test_conn();

        let result = update_expense(&conn, 999, &sample(10.0, Category::Food, "2026-08-01", ""));
        assert!(result.is_err());
    }

    #[test]
    fn test_delete() {
        let conn = test_conn();

        let id = insert_expense(&conn, &sample(10.0, Category::Food, "2026-08-01", "")).unwrap();
        delete_expense(&conn, id).unwrap();

        assert!(get_expense(&conn, id).unwrap().is_none());
        assert!(delete_expense(&conn, id).is_err());
    }

    #[test]
    fn test_wipe() {
        let conn = test_conn();

        insert_expense(&conn, &sample(10.0, Category::Food, "2026-08-01", "")).unwrap();
        insert_expense(&conn, &sample(20.0, Category::Bills, "2026-08-02", "")).unwrap();

        assert_eq!(delete_all_expenses(&conn).unwrap(), 2);
        assert_eq!(count_expenses(&conn).unwrap(), 0);

        // Wiping an empty store succeeds with 0
        assert_eq!(delete_all_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn test_date_range_bounds_inclusive() {
        let conn = test_conn();

        insert_expense(&conn, &sample(1.0, Category::Food, "2026-07-31", "")).unwrap();
        insert_expense(&conn, &sample(2.0, Category::Food, "2026-08-01", "")).unwrap();
        insert_expense(&conn, &sample(3.0, Category::Food, "2026-08-05", "")).unwrap();
        insert_expense(&conn, &sample(4.0, Category::Food, "2026-08-06", "")).unwrap();

        let hits = expenses_by_date_range(&conn, date("2026-08-01"), date("2026-08-05")).unwrap();

        let amounts: Vec<f64> = hits.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![3.0, 2.0]);
    }

    #[test]
    fn test_filter_by_category() {
        let conn = test_conn();

        insert_expense(&conn, &sample(1.0, Category::Food, "2026-08-01", "")).unwrap();
        insert_expense(&conn, &sample(2.0, Category::Travel, "2026-08-02", "")).unwrap();
        insert_expense(
            &conn,
            &sample(3.0, Category::Custom("Pets".to_string()), "2026-08-03", ""),
        )
        .unwrap();

        let travel = expenses_by_category(&conn, &Category::Travel).unwrap();
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].amount, 2.0);

        let pets = expenses_by_category(&conn, &Category::Custom("Pets".to_string())).unwrap();
        assert_eq!(pets.len(), 1);
    }

    #[test]
    fn test_ordering_newest_first() {
        let conn = test_conn();

        insert_expense(&conn, &sample(1.0, Category::Food, "2026-08-01", "")).unwrap();
        insert_expense(&conn, &sample(2.0, Category::Food, "2026-08-05", "")).unwrap();
        insert_expense(&conn, &sample(3.0, Category::Food, "2026-08-03", "")).unwrap();

        let all = get_all_expenses(&conn).unwrap();
        let dates: Vec<String> = all.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-08-05", "2026-08-03", "2026-08-01"]);
    }

    #[test]
    fn test_custom_category_round_trip() {
        let conn = test_conn();

        let id = insert_expense(
            &conn,
            &sample(
                75.0,
                Category::Custom("Pet Supplies".to_string()),
                "2026-08-01",
                "",
            ),
        )
        .unwrap();

        let expense = get_expense(&conn, id).unwrap().unwrap();
        assert_eq!(expense.category.name(), "Pet Supplies");
    }

    #[test]
    fn test_settings_round_trip() {
        let conn = test_conn();

        assert!(get_setting(&conn, "currency").unwrap().is_none());

        set_setting(&conn, "currency", "₹").unwrap();
        assert_eq!(
            get_setting(&conn, "currency").unwrap(),
            Some("₹".to_string())
        );

        set_setting(&conn, "currency", "$").unwrap();
        assert_eq!(
            get_setting(&conn, "currency").unwrap(),
            Some("$".to_string())
        );
    }
}
