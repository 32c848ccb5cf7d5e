// Declarative chart configurations
// Built from the aggregates and serialized as Chart.js-compatible JSON;
// rendering belongs to whatever consumes the config.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::stats::CategoryTotal;

/// Accent color for the trend dataset
const PRIMARY_COLOR: &str = "#6366f1";

/// One chart, ready to serialize: `{"type": ..., "data": ..., "options": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: ChartData,
    pub options: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,

    // Chart.js field names
    #[serde(rename = "backgroundColor")]
    pub background_color: Value,
    #[serde(rename = "borderColor")]
    pub border_color: Value,
    #[serde(rename = "borderWidth")]
    pub border_width: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

/// Trend chart style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendKind {
    Line,
    Bar,
}

impl TrendKind {
    pub fn parse(s: &str) -> Option<TrendKind> {
        match s.trim().to_lowercase().as_str() {
            "line" => Some(TrendKind::Line),
            "bar" => Some(TrendKind::Bar),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TrendKind::Line => "line",
            TrendKind::Bar => "bar",
        }
    }
}

/// Doughnut chart of the category breakdown.
/// Returns `None` when there is nothing to draw (empty or all-zero), which
/// is the caller's cue to show an empty state.
pub fn pie_chart(breakdown: &[CategoryTotal]) -> Option<ChartConfig> {
    if breakdown.is_empty() || breakdown.iter().all(|entry| entry.amount == 0.0) {
        return None;
    }

    let labels: Vec<String> = breakdown
        .iter()
        .map(|entry| entry.category.name().to_string())
        .collect();
    let amounts: Vec<f64> = breakdown.iter().map(|entry| entry.amount).collect();
    let colors: Vec<&str> = breakdown
        .iter()
        .map(|entry| entry.category.color())
        .collect();

    Some(ChartConfig {
        chart_type: "doughnut".to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: None,
                data: amounts,
                background_color: json!(colors),
                border_color: json!("#ffffff"),
                border_width: 2,
                fill: None,
                tension: None,
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": true,
            "cutout": "60%",
            "plugins": {
                "legend": {
                    "position": "bottom",
                    "labels": { "usePointStyle": true, "pointStyle": "circle" }
                }
            }
        }),
    })
}

/// Line or bar chart of daily spending, labels in ascending date order.
/// `None` when there are no days to plot.
pub fn trend_chart(daily: &BTreeMap<NaiveDate, f64>, kind: TrendKind) -> Option<ChartConfig> {
    if daily.is_empty() {
        return None;
    }

    let labels: Vec<String> = daily
        .keys()
        .map(|date| date.format("%-d %b").to_string())
        .collect();
    let amounts: Vec<f64> = daily.values().copied().collect();

    let background = match kind {
        // Translucent fill under the line
        TrendKind::Line => format!("{}33", PRIMARY_COLOR),
        TrendKind::Bar => PRIMARY_COLOR.to_string(),
    };

    Some(ChartConfig {
        chart_type: kind.as_str().to_string(),
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: Some("Daily Spending".to_string()),
                data: amounts,
                background_color: json!(background),
                border_color: json!(PRIMARY_COLOR),
                border_width: 2,
                fill: Some(kind == TrendKind::Line),
                tension: Some(0.4),
            }],
        },
        options: json!({
            "responsive": true,
            "maintainAspectRatio": true,
            "interaction": { "intersect": false, "mode": "index" },
            "plugins": { "legend": { "display": false } },
            "scales": {
                "x": { "grid": { "display": false } },
                "y": { "beginAtZero": true }
            }
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;

    fn entry(category: Category, amount: f64) -> CategoryTotal {
        CategoryTotal { category, amount }
    }

    #[test]
    fn test_pie_chart_empty_states() {
        assert!(pie_chart(&[]).is_none());
        assert!(pie_chart(&[entry(Category::Food, 0.0)]).is_none());
    }

    #[test]
    fn test_pie_chart_labels_and_colors_align() {
        let breakdown = vec![entry(Category::Travel, 90.0), entry(Category::Food, 10.0)];

        let config = pie_chart(&breakdown).unwrap();
        assert_eq!(config.chart_type, "doughnut");
        assert_eq!(config.data.labels, vec!["Travel", "Food"]);
        assert_eq!(config.data.datasets[0].data, vec![90.0, 10.0]);
        assert_eq!(
            config.data.datasets[0].background_color,
            json!(["#3b82f6", "#f59e0b"])
        );
    }

    #[test]
    fn test_pie_chart_serialized_shape() {
        let config = pie_chart(&[entry(Category::Food, 10.0)]).unwrap();
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["type"], "doughnut");
        assert_eq!(value["options"]["cutout"], "60%");
        assert_eq!(value["data"]["datasets"][0]["borderWidth"], 2);
    }

    #[test]
    fn test_trend_chart_empty() {
        assert!(trend_chart(&BTreeMap::new(), TrendKind::Line).is_none());
    }

    #[test]
    fn test_trend_chart_ordered_labels() {
        let mut daily = BTreeMap::new();
        daily.insert(
            NaiveDate::parse_from_str("2026-08-03", "%Y-%m-%d").unwrap(),
            12.0,
        );
        daily.insert(
            NaiveDate::parse_from_str("2026-08-01", "%Y-%m-%d").unwrap(),
            10.0,
        );

        let config = trend_chart(&daily, TrendKind::Line).unwrap();
        assert_eq!(config.data.labels, vec!["1 Aug", "3 Aug"]);
        assert_eq!(config.data.datasets[0].data, vec![10.0, 12.0]);
        assert_eq!(config.data.datasets[0].fill, Some(true));
    }

    #[test]
    fn test_trend_chart_bar_style() {
        let mut daily = BTreeMap::new();
        daily.insert(
            NaiveDate::parse_from_str("2026-08-01", "%Y-%m-%d").unwrap(),
            10.0,
        );

        let config = trend_chart(&daily, TrendKind::Bar).unwrap();
        assert_eq!(config.chart_type, "bar");
        assert_eq!(config.data.datasets[0].fill, Some(false));
        assert_eq!(config.data.datasets[0].background_color, json!("#6366f1"));
    }

    #[test]
    fn test_trend_kind_parse() {
        assert_eq!(TrendKind::parse("line"), Some(TrendKind::Line));
        assert_eq!(TrendKind::parse("BAR"), Some(TrendKind::Bar));
        assert_eq!(TrendKind::parse("pie"), None);
    }
}
