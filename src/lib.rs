// Spend Analyzer - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod categories;
pub mod charts;
pub mod db;
pub mod export;
pub mod format;
pub mod range;
pub mod stats;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use categories::{all_categories, detect_category, Category, CategoryDetector, KeywordRule};
pub use charts::{pie_chart, trend_chart, ChartConfig, TrendKind};
pub use db::{
    count_expenses, delete_all_expenses, delete_expense, expenses_by_category,
    expenses_by_date_range, get_all_expenses, get_expense, get_setting, insert_expense,
    open_database, set_setting, setup_database, update_expense, Expense, NewExpense,
    ValidationError,
};
pub use export::{
    default_export_filename, export_csv, export_csv_string, export_csv_to_path, import_csv,
    import_csv_from_path,
};
pub use format::{format_currency, format_date, CURRENCY_KEY, DEFAULT_CURRENCY};
pub use range::RangeFilter;
pub use stats::{category_breakdown, daily_totals, summarize, top_category, total, CategoryTotal, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
