use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use spend_analyzer::{
    all_categories, category_breakdown, default_export_filename, detect_category, export_csv_to_path,
    format_currency, format_date, get_all_expenses, get_setting, import_csv_from_path,
    insert_expense, open_database, set_setting, stats, Category, NewExpense, RangeFilter,
    CURRENCY_KEY, DEFAULT_CURRENCY,
};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("add") => run_add(&args[2..]),
        Some("list") => run_list(&args[2..]),
        Some("summary") => run_summary(),
        Some("edit") => run_edit(&args[2..]),
        Some("delete") => run_delete(&args[2..]),
        Some("wipe") => run_wipe(),
        Some("export") => run_export(&args[2..]),
        Some("import") => run_import(&args[2..]),
        Some("currency") => run_currency(&args[2..]),
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
        // Default: interactive ledger
        None => run_ui_mode(),
    }
}

fn print_usage() {
    println!("Spend Analyzer — personal expense tracker");
    println!();
    println!("Usage:");
    println!("  spend-analyzer                              interactive ledger (TUI)");
    println!("  spend-analyzer add <amount> <category|auto> <date|today> [note...]");
    println!("  spend-analyzer list [today|week|month|year|all] [category]");
    println!("  spend-analyzer summary");
    println!("  spend-analyzer edit <id> <amount> <category|auto> <date|today> [note...]");
    println!("  spend-analyzer delete <id>");
    println!("  spend-analyzer wipe");
    println!("  spend-analyzer export [path]");
    println!("  spend-analyzer import <path>");
    println!("  spend-analyzer currency [symbol]");
    println!();
    println!("Categories: {}", category_names().join(", "));
    println!("Database path comes from SPEND_DB (default: spend.db)");
}

fn category_names() -> Vec<String> {
    all_categories()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

fn db_path() -> PathBuf {
    PathBuf::from(env::var("SPEND_DB").unwrap_or_else(|_| "spend.db".to_string()))
}

fn open() -> Result<Connection> {
    open_database(&db_path())
}

fn currency_symbol(conn: &Connection) -> String {
    if let Ok(Some(symbol)) = get_setting(conn, CURRENCY_KEY) {
        return symbol;
    }
    env::var("SPEND_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_amount(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("Invalid amount: {}", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD or 'today'): {}", s))
}

fn parse_id(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .with_context(|| format!("Invalid expense id: {}", s))
}

/// Resolve the category argument; "auto" runs keyword detection on the note
fn resolve_category(raw: &str, note: &str) -> Result<Category> {
    if raw.eq_ignore_ascii_case("auto") {
        return detect_category(note).with_context(|| {
            format!("Could not detect a category from the note {:?}; pass one explicitly", note)
        });
    }
    Ok(Category::parse(raw))
}

fn parse_expense_args(args: &[String]) -> Result<NewExpense> {
    if args.len() < 3 {
        bail!("Expected: <amount> <category|auto> <date|today> [note...]");
    }

    let amount = parse_amount(&args[0])?;
    let date = parse_date(&args[2])?;
    let note = args[3..].join(" ");
    let category = resolve_category(&args[1], &note)?;

    Ok(NewExpense {
        amount,
        category,
        date,
        note,
    })
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_add(args: &[String]) -> Result<()> {
    let expense = parse_expense_args(args)?;
    let conn = open()?;

    let id = insert_expense(&conn, &expense)?;
    let symbol = currency_symbol(&conn);

    println!(
        "✓ Added expense #{}: {} {} on {} ({})",
        id,
        format_currency(expense.amount, &symbol),
        expense.category.name(),
        expense.date,
        if expense.note.is_empty() {
            "no note"
        } else {
            expense.note.as_str()
        },
    );

    Ok(())
}

fn run_list(args: &[String]) -> Result<()> {
    let conn = open()?;
    let symbol = currency_symbol(&conn);
    let now = today();

    let range = match args.first() {
        Some(token) => RangeFilter::parse(token)
            .with_context(|| format!("Invalid range: {} (today|week|month|year|all)", token))?,
        None => RangeFilter::All,
    };
    let category = args.get(1).map(|s| Category::parse(s));

    let (start, end) = range.bounds(now);
    let mut expenses = spend_analyzer::expenses_by_date_range(&conn, start, end)?;

    if let Some(cat) = &category {
        expenses.retain(|e| &e.category == cat);
    }

    if expenses.is_empty() {
        println!("No expenses for this filter.");
        return Ok(());
    }

    println!(
        "📒 {} expenses ({}{})",
        expenses.len(),
        range.label(),
        category
            .as_ref()
            .map(|c| format!(", {}", c.name()))
            .unwrap_or_default(),
    );
    println!("────────────────────────────────────────────────────────");

    for e in &expenses {
        println!(
            "#{:<5} {:<12} {:<16} {:>12}  {}",
            e.id,
            format_date(e.date, now),
            format!("{} {}", e.category.emoji(), e.category.name()),
            format_currency(e.amount, &symbol),
            e.note,
        );
    }

    println!("────────────────────────────────────────────────────────");
    println!("Total: {}", format_currency(stats::total(&expenses), &symbol));

    Ok(())
}

fn run_summary() -> Result<()> {
    let conn = open()?;
    let symbol = currency_symbol(&conn);

    let expenses = get_all_expenses(&conn)?;
    let summary = stats::summarize(&expenses, today());

    println!("📊 Spending summary");
    println!("  Today:        {}", format_currency(summary.today, &symbol));
    println!("  Last 7 days:  {}", format_currency(summary.week, &symbol));
    println!("  Last month:   {}", format_currency(summary.month, &symbol));

    match &summary.top_category {
        Some(entry) => println!(
            "  Top category: {} {} ({})",
            entry.category.emoji(),
            entry.category.name(),
            format_currency(entry.amount, &symbol),
        ),
        None => println!("  Top category: -"),
    }

    let breakdown = category_breakdown(&expenses);
    if !breakdown.is_empty() {
        println!("\n  By category:");
        for entry in &breakdown {
            println!(
                "    {:<16} {}",
                format!("{} {}", entry.category.emoji(), entry.category.name()),
                format_currency(entry.amount, &symbol),
            );
        }
    }

    Ok(())
}

fn run_edit(args: &[String]) -> Result<()> {
    if args.is_empty() {
        bail!("Expected: <id> <amount> <category|auto> <date|today> [note...]");
    }

    let id = parse_id(&args[0])?;
    let updates = parse_expense_args(&args[1..])?;

    let conn = open()?;
    let updated = spend_analyzer::update_expense(&conn, id, &updates)?;
    let symbol = currency_symbol(&conn);

    println!(
        "✓ Updated expense #{}: {} {} on {}",
        updated.id,
        format_currency(updated.amount, &symbol),
        updated.category.name(),
        updated.date,
    );

    Ok(())
}

fn run_delete(args: &[String]) -> Result<()> {
    let id = parse_id(args.first().context("Expected: <id>")?)?;

    let conn = open()?;
    spend_analyzer::delete_expense(&conn, id)?;

    println!("✓ Deleted expense #{}", id);
    Ok(())
}

fn run_wipe() -> Result<()> {
    let conn = open()?;
    let count = spend_analyzer::count_expenses(&conn)?;

    if count == 0 {
        println!("Nothing to delete.");
        return Ok(());
    }

    println!(
        "⚠️  This will delete ALL {} expenses. This cannot be undone.",
        count
    );
    print!("Type 'yes' to confirm: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;

    if answer.trim() != "yes" {
        println!("Aborted.");
        return Ok(());
    }

    let removed = spend_analyzer::delete_all_expenses(&conn)?;
    println!("✓ Deleted {} expenses", removed);
    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let conn = open()?;
    let expenses = get_all_expenses(&conn)?;

    let path = match args.first() {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(default_export_filename(today())),
    };

    let written = export_csv_to_path(&expenses, &path)?;
    println!("✓ Exported {} expenses to {:?}", written, path);
    Ok(())
}

fn run_import(args: &[String]) -> Result<()> {
    let path = PathBuf::from(args.first().context("Expected: <path>")?);

    println!("📂 Importing expenses from {:?}...", path);

    let records = import_csv_from_path(&path)?;
    let conn = open()?;

    let mut inserted = 0;
    for record in &records {
        insert_expense(&conn, record)?;
        inserted += 1;
    }

    println!("✓ Imported {} expenses", inserted);
    Ok(())
}

fn run_currency(args: &[String]) -> Result<()> {
    let conn = open()?;

    match args.first() {
        Some(symbol) => {
            set_setting(&conn, CURRENCY_KEY, symbol)?;
            println!("✓ Currency symbol set to {}", symbol);
        }
        None => {
            println!("Currency symbol: {}", currency_symbol(&conn));
        }
    }

    Ok(())
}

// ============================================================================
// TUI MODE
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use spend_analyzer::ui;

    let conn = open()?;
    let expenses = get_all_expenses(&conn)?;
    let symbol = currency_symbol(&conn);

    let mut app = ui::App::new(expenses, today(), symbol);
    ui::run_ui(&mut app, &conn)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI commands: spend-analyzer help");
    std::process::exit(1);
}
