//! Policy recommendation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::weather::WeatherSnapshot;

/// Policy area a rule belongs to.
///
/// Declaration order is the fixed category order used for sorting and for
/// grouping report sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Energy,
    Water,
    Infrastructure,
    Agriculture,
    PublicHealth,
    Emissions,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Energy,
        Category::Water,
        Category::Infrastructure,
        Category::Agriculture,
        Category::PublicHealth,
        Category::Emissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Energy => "energy",
            Category::Water => "water",
            Category::Infrastructure => "infrastructure",
            Category::Agriculture => "agriculture",
            Category::PublicHealth => "public-health",
            Category::Emissions => "emissions",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        let label = s.trim().to_ascii_lowercase();
        Category::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Heading used in reports
    pub fn title(&self) -> &'static str {
        match self {
            Category::Energy => "Energy",
            Category::Water => "Water",
            Category::Infrastructure => "Infrastructure",
            Category::Agriculture => "Agriculture",
            Category::PublicHealth => "Public Health",
            Category::Emissions => "Emissions",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a recommendation, ordered low < medium < high < critical
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Priority contribution of the severity
    pub fn weight(&self) -> i32 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 10,
            Severity::High => 20,
            Severity::Critical => 30,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot reading that a rule's predicate consulted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerFact {
    pub field: String,
    pub value: String,
}

/// One rendered policy suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub text: String,
    pub priority: i32,
    pub rationale: Vec<TriggerFact>,
}

/// Ordered recommendations derived from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSet {
    pub snapshot: WeatherSnapshot,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recommendation> {
        self.recommendations.iter()
    }

    /// Recommendations of one category, in set order
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |r| r.category == category)
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.recommendations.iter().map(|r| r.rule_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_is_declaration_order() {
        let mut shuffled = vec![
            Category::Emissions,
            Category::Water,
            Category::PublicHealth,
            Category::Energy,
            Category::Agriculture,
            Category::Infrastructure,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse_str("public-health"), Some(Category::PublicHealth));
        assert_eq!(Category::parse_str("Energy"), Some(Category::Energy));
        assert_eq!(Category::parse_str("transport"), None);
    }

    #[test]
    fn test_severity_weight_is_monotonic() {
        let ordered = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].weight() < pair[1].weight());
        }
        assert_eq!(Severity::Critical.weight(), 30);
    }

    #[test]
    fn test_category_serde_is_kebab_case() {
        let json = serde_json::to_string(&Category::PublicHealth).unwrap();
        assert_eq!(json, "\"public-health\"");
    }
}
