// Aggregation over expense records
// Pure functions: the caller picks the record set (full store or a
// date-filtered subset), these just fold over it.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::categories::Category;
use crate::db::Expense;

/// Per-category total, used by the breakdown and the charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

/// Summary card values: trailing totals plus the month's top category
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub today: f64,
    pub week: f64,
    pub month: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_category: Option<CategoryTotal>,
}

/// Sum of all amounts
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Amounts summed per category, largest first.
/// Ties break on category name so the order is stable.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut sums: HashMap<Category, f64> = HashMap::new();

    for expense in expenses {
        *sums.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    let mut breakdown: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, amount)| CategoryTotal { category, amount })
        .collect();

    breakdown.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.name().cmp(b.category.name()))
    });

    breakdown
}

/// Per-day sums in ascending date order (for the trend chart)
pub fn daily_totals(expenses: &[Expense]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();

    for expense in expenses {
        *totals.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    totals
}

/// Category with the highest summed amount, `None` on empty input
pub fn top_category(expenses: &[Expense]) -> Option<CategoryTotal> {
    category_breakdown(expenses).into_iter().next()
}

/// Build the summary cards: totals for today, the trailing 7 days, and the
/// trailing month, plus the top category over the trailing month.
pub fn summarize(expenses: &[Expense], today: NaiveDate) -> Summary {
    let week_start = today.checked_sub_days(Days::new(7)).unwrap_or(today);
    let month_start = today.checked_sub_months(Months::new(1)).unwrap_or(today);

    let in_window = |e: &&Expense, start: NaiveDate| e.date >= start && e.date <= today;

    let today_total = expenses
        .iter()
        .filter(|e| e.date == today)
        .map(|e| e.amount)
        .sum();

    let week_total = expenses
        .iter()
        .filter(|e| in_window(e, week_start))
        .map(|e| e.amount)
        .sum();

    let month_expenses: Vec<Expense> = expenses
        .iter()
        .filter(|e| in_window(e, month_start))
        .cloned()
        .collect();

    Summary {
        today: today_total,
        week: week_total,
        month: total(&month_expenses),
        top_category: top_category(&month_expenses),
    }
}
