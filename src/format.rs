// Display formatting for amounts and dates

use chrono::{Days, NaiveDate};

/// Default currency symbol when neither the settings store nor the
/// environment provides one
pub const DEFAULT_CURRENCY: &str = "₹";

/// Settings key holding the currency symbol
pub const CURRENCY_KEY: &str = "currency";

/// Format an amount with the currency symbol. Whole amounts drop the
/// decimals, everything else keeps two.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let mut rendered = format!("{:.2}", amount);
    if rendered.ends_with(".00") {
        rendered.truncate(rendered.len() - 3);
    }
    format!("{}{}", symbol, rendered)
}

/// Render a date relative to `today`: "Today", "Yesterday", or "7 Aug 2026"
pub fn format_date(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        return "Today".to_string();
    }

    if Some(date) == today.checked_sub_days(Days::new(1)) {
        return "Yesterday".to_string();
    }

    date.format("%-d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_format_currency_trims_whole_amounts() {
        assert_eq!(format_currency(1500.0, "₹"), "₹1500");
        assert_eq!(format_currency(49.9, "₹"), "₹49.90");
        assert_eq!(format_currency(0.5, "$"), "$0.50");
    }

    #[test]
    fn test_format_date_relative() {
        let today = date("2026-08-07");

        assert_eq!(format_date(today, today), "Today");
        assert_eq!(format_date(date("2026-08-06"), today), "Yesterday");
        assert_eq!(format_date(date("2026-03-05"), today), "5 Mar 2026");
    }
}
