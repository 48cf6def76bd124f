//! Query expansion for the search API.
//!
//! Rules append product vocabulary to the query sent upstream so the API
//! favors the documentation area the assistant is about. Ranking always
//! sees the user's raw query.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Append `append` when the query contains any of `when_any` (or always,
/// if `when_any` is empty) and none of `unless_any`.
///
/// Matching is case-insensitive substring matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionRule {
    #[serde(default)]
    pub when_any: Vec<String>,

    #[serde(default)]
    pub unless_any: Vec<String>,

    pub append: String,
}

impl ExpansionRule {
    fn applies_to(&self, query_lower: &str) -> bool {
        let contains = |term: &String| query_lower.contains(&term.to_lowercase());
        let triggered = self.when_any.is_empty() || self.when_any.iter().any(contains);
        triggered && !self.unless_any.iter().any(contains)
    }
}

/// Ordered set of expansion rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpander {
    rules: Vec<ExpansionRule>,
}

impl QueryExpander {
    pub fn new(rules: Vec<ExpansionRule>) -> Self {
        Self { rules }
    }

    /// An expander that leaves queries untouched.
    pub fn disabled() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[ExpansionRule] {
        &self.rules
    }

    /// Expand `query`. Returns the input unchanged when no rule fires.
    pub fn expand(&self, query: &str) -> String {
        let query_lower = query.to_lowercase();
        let additions: Vec<&str> = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(&query_lower))
            .map(|rule| rule.append.trim())
            .filter(|append| !append.is_empty())
            .collect();

        if additions.is_empty() {
            return query.to_string();
        }

        let expanded = format!("{} {}", query.trim(), additions.join(" "));
        debug!("Expanded query to {expanded:?}");
        expanded
    }
}

impl Default for QueryExpander {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Rules tuned for Microsoft 365 Copilot documentation.
pub fn default_rules() -> Vec<ExpansionRule> {
    vec![
        ExpansionRule {
            when_any: Vec::new(),
            unless_any: terms(&["copilot", "microsoft 365"]),
            append: "Microsoft 365 Copilot".to_string(),
        },
        ExpansionRule {
            when_any: terms(&[
                "data",
                "security",
                "privacy",
                "protect",
                "compliance",
                "governance",
            ]),
            unless_any: terms(&["enterprise"]),
            append: "enterprise data protection".to_string(),
        },
        ExpansionRule {
            when_any: terms(&["cost", "price", "license", "subscription"]),
            unless_any: Vec::new(),
            append: "licensing".to_string(),
        },
    ]
}
