// Trailing date windows used by the list/summary filters

use chrono::{Days, Months, NaiveDate};

/// Preset date-range filter. All windows end today and trail backwards;
/// `All` starts at a floor date well before any recorded expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFilter {
    Today,
    Week,
    Month,
    Year,
    All,
}

impl RangeFilter {
    /// Parse a CLI/API token (`today|week|month|year|all`)
    pub fn parse(s: &str) -> Option<RangeFilter> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(RangeFilter::Today),
            "week" => Some(RangeFilter::Week),
            "month" => Some(RangeFilter::Month),
            "year" => Some(RangeFilter::Year),
            "all" => Some(RangeFilter::All),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangeFilter::Today => "Today",
            RangeFilter::Week => "Week",
            RangeFilter::Month => "Month",
            RangeFilter::Year => "Year",
            RangeFilter::All => "All",
        }
    }

    /// Inclusive `(start, end)` bounds for the window ending on `today`
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            RangeFilter::Today => today,
            RangeFilter::Week => today.checked_sub_days(Days::new(7)).unwrap_or(today),
            RangeFilter::Month => today.checked_sub_months(Months::new(1)).unwrap_or(today),
            RangeFilter::Year => today.checked_sub_months(Months::new(12)).unwrap_or(today),
            RangeFilter::All => NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(today),
        };

        (start, today)
    }

    pub fn next(&self) -> RangeFilter {
        match self {
            RangeFilter::Today => RangeFilter::Week,
            RangeFilter::Week => RangeFilter::Month,
            RangeFilter::Month => RangeFilter::Year,
            RangeFilter::Year => RangeFilter::All,
            RangeFilter::All => RangeFilter::Today,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(RangeFilter::parse("today"), Some(RangeFilter::Today));
        assert_eq!(RangeFilter::parse(" WEEK "), Some(RangeFilter::Week));
        assert_eq!(RangeFilter::parse("quarter"), None);
    }

    #[test]
    fn test_bounds_today() {
        let today = date("2026-08-07");
        assert_eq!(RangeFilter::Today.bounds(today), (today, today));
    }

    #[test]
    fn test_bounds_trailing_windows() {
        let today = date("2026-08-07");

        assert_eq!(
            RangeFilter::Week.bounds(today),
            (date("2026-07-31"), today)
        );
        assert_eq!(
            RangeFilter::Month.bounds(today),
            (date("2026-07-07"), today)
        );
        assert_eq!(
            RangeFilter::Year.bounds(today),
            (date("2025-08-07"), today)
        );
    }

    #[test]
    fn test_bounds_month_end_clamping() {
        // One month before March 31 clamps to the end of February
        let today = date("2026-03-31");
        assert_eq!(
            RangeFilter::Month.bounds(today),
            (date("2026-02-28"), today)
        );
    }

    #[test]
    fn test_bounds_all() {
        let today = date("2026-08-07");
        assert_eq!(RangeFilter::All.bounds(today), (date("2000-01-01"), today));
    }
}
