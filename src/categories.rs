// Category taxonomy and keyword detection
// Fixed expense categories plus free-form custom names

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// CATEGORY
// ============================================================================

/// Expense category.
///
/// The fixed variants carry display metadata (emoji, color) and a keyword
/// list for auto-detection. Anything outside the fixed set round-trips as
/// `Custom` with the user's name preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Travel,
    Bills,
    Shopping,
    Entertainment,
    Health,
    Custom(String),
}

impl Category {
    /// Category name as stored in the database and shown in the UI
    pub fn name(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Custom(name) => name,
        }
    }

    /// Parse a category name. Fixed names match case-insensitively,
    /// everything else becomes `Custom` with whitespace trimmed.
    pub fn parse(s: &str) -> Category {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "food" => Category::Food,
            "travel" => Category::Travel,
            "bills" => Category::Bills,
            "shopping" => Category::Shopping,
            "entertainment" => Category::Entertainment,
            "health" => Category::Health,
            _ => Category::Custom(trimmed.to_string()),
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Food => "🍔",
            Category::Travel => "🚗",
            Category::Bills => "💡",
            Category::Shopping => "🛍️",
            Category::Entertainment => "🎬",
            Category::Health => "💊",
            Category::Custom(_) => "💰",
        }
    }

    /// Hex color used by the charts
    pub fn color(&self) -> &'static str {
        match self {
            Category::Food => "#f59e0b",
            Category::Travel => "#3b82f6",
            Category::Bills => "#8b5cf6",
            Category::Shopping => "#ec4899",
            Category::Entertainment => "#f43f5e",
            Category::Health => "#10b981",
            Category::Custom(_) => "#6b7280",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Category::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Serialize as the plain name so records, CSV rows, and API payloads all
// carry the same string form.
impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::parse(&s))
    }
}

/// Fixed category set in declaration order (for pickers and filters)
pub fn all_categories() -> Vec<Category> {
    vec![
        Category::Food,
        Category::Travel,
        Category::Bills,
        Category::Shopping,
        Category::Entertainment,
        Category::Health,
    ]
}

// ============================================================================
// KEYWORD DETECTION
// ============================================================================

/// One detection rule: note text containing any keyword maps to the category
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: Vec<&'static str>,
}

/// Linear keyword scanner over the note text.
///
/// Rules are checked in order and the first keyword hit wins, so the fixed
/// category order doubles as detection precedence. `Custom` categories are
/// never auto-detected.
pub struct CategoryDetector {
    rules: Vec<KeywordRule>,
}

impl CategoryDetector {
    /// Detector with the built-in keyword table
    pub fn new() -> Self {
        CategoryDetector {
            rules: vec![
                KeywordRule {
                    category: Category::Food,
                    keywords: vec![
                        "food", "lunch", "dinner", "breakfast", "restaurant", "cafe", "snack",
                        "meal",
                    ],
                },
                KeywordRule {
                    category: Category::Travel,
                    keywords: vec![
                        "travel", "uber", "taxi", "bus", "train", "flight", "fuel", "gas",
                        "petrol",
                    ],
                },
                KeywordRule {
                    category: Category::Bills,
                    keywords: vec![
                        "bill", "electricity", "water", "internet", "phone", "rent", "utility",
                    ],
                },
                KeywordRule {
                    category: Category::Shopping,
                    keywords: vec!["shopping", "clothes", "amazon", "flipkart", "store", "mall"],
                },
                KeywordRule {
                    category: Category::Entertainment,
                    keywords: vec![
                        "movie", "entertainment", "game", "netflix", "spotify", "concert", "show",
                    ],
                },
                KeywordRule {
                    category: Category::Health,
                    keywords: vec![
                        "health", "medicine", "doctor", "hospital", "pharmacy", "gym", "fitness",
                    ],
                },
            ],
        }
    }

    /// Create detector from a custom rule list
    pub fn with_rules(rules: Vec<KeywordRule>) -> Self {
        CategoryDetector { rules }
    }

    pub fn add_rule(&mut self, rule: KeywordRule) {
        self.rules.push(rule);
    }

    /// Detect a category from free-form note text
    pub fn detect(&self, note: &str) -> Option<Category> {
        if note.trim().is_empty() {
            return None;
        }

        let lower = note.to_lowercase();

        for rule in &self.rules {
            for keyword in &rule.keywords {
                if lower.contains(keyword) {
                    return Some(rule.category.clone());
                }
            }
        }

        None
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CategoryDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect with the built-in keyword table
pub fn detect_category(note: &str) -> Option<Category> {
    CategoryDetector::new().detect(note)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixed_names() {
        assert_eq!(Category::parse("Food"), Category::Food);
        assert_eq!(Category::parse("food"), Category::Food);
        assert_eq!(Category::parse("  HEALTH "), Category::Health);
    }

    #[test]
    fn test_parse_custom_name() {
        let cat = Category::parse("Pet Supplies");
        assert_eq!(cat, Category::Custom("Pet Supplies".to_string()));
        assert_eq!(cat.name(), "Pet Supplies");
        assert!(cat.is_custom());
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Category::Entertainment).unwrap();
        assert_eq!(json, "\"Entertainment\"");

        let back: Category = serde_json::from_str("\"Groceries\"").unwrap();
        assert_eq!(back, Category::Custom("Groceries".to_string()));
    }

    #[test]
    fn test_detect_from_note() {
        let detector = CategoryDetector::new();

        assert_eq!(detector.detect("lunch with team"), Some(Category::Food));
        assert_eq!(detector.detect("UBER to airport"), Some(Category::Travel));
        assert_eq!(
            detector.detect("netflix subscription"),
            Some(Category::Entertainment)
        );
        assert_eq!(detector.detect("monthly gym fee"), Some(Category::Health));
    }

    #[test]
    fn test_detect_no_match() {
        let detector = CategoryDetector::new();

        assert_eq!(detector.detect("birthday gift"), None);
        assert_eq!(detector.detect(""), None);
        assert_eq!(detector.detect("   "), None);
    }

    #[test]
    fn test_detect_first_rule_wins() {
        let detector = CategoryDetector::new();

        // "dinner" (Food) appears before "uber" (Travel) in rule order
        assert_eq!(detector.detect("uber after dinner"), Some(Category::Food));
    }

    #[test]
    fn test_custom_rules() {
        let mut detector = CategoryDetector::with_rules(vec![]);
        assert_eq!(detector.detect("coffee"), None);

        detector.add_rule(KeywordRule {
            category: Category::Custom("Office".to_string()),
            keywords: vec!["stationery", "printer"],
        });

        assert_eq!(
            detector.detect("printer ink refill"),
            Some(Category::Custom("Office".to_string()))
        );
    }

    #[test]
    fn test_all_categories_excludes_custom() {
        let all = all_categories();
        assert_eq!(all.len(), 6);
        assert!(all.iter().all(|c| !c.is_custom()));
    }
}
