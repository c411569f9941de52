//! Declarative mapping from endpoints to the resource tags they touch.
//!
//! A read is cached with the tags of its endpoint. A successful write to an
//! endpoint invalidates its own tags plus whatever the matching rule lists in
//! `invalidates`, so call sites never hardcode which keys to clear.

use serde::{Deserialize, Serialize};

/// One endpoint family and its cache dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    /// Path prefix, matched on segment boundaries (`/api/tasks` matches
    /// `/api/tasks`, `/api/tasks/7`, `/api/tasks?status=done`).
    pub prefix: String,

    /// Tags attached to cached reads under this prefix.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Extra tags dropped after a successful write under this prefix.
    #[serde(default)]
    pub invalidates: Vec<String>,
}

impl TagRule {
    pub fn new(prefix: &str, tags: &[&str], invalidates: &[&str]) -> Self {
        Self {
            prefix: prefix.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            invalidates: invalidates.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Rules for the bizdesk backend.
pub fn default_tag_rules() -> Vec<TagRule> {
    vec![
        TagRule::new("/api/warehouse/products", &["products"], &["reports", "transactions"]),
        TagRule::new("/api/warehouse/movements", &["movements"], &["products", "transactions", "reports"]),
        TagRule::new("/api/transactions", &["transactions"], &[]),
        TagRule::new("/api/reports", &["reports"], &[]),
        TagRule::new("/api/employees", &["employees"], &["tasks"]),
        TagRule::new("/api/tasks", &["tasks"], &["reports"]),
    ]
}

/// Compiled rule set.
#[derive(Debug, Clone, Default)]
pub struct TagRules {
    rules: Vec<TagRule>,
}

impl TagRules {
    pub fn new(rules: Vec<TagRule>) -> Self {
        Self { rules }
    }

    /// Tags a cached read of `endpoint` depends on.
    ///
    /// Falls back to a tag derived from the first resource segment when no
    /// rule matches, so every API key carries at least one tag.
    pub fn tags_for(&self, endpoint: &str) -> Vec<String> {
        let path = strip_query(endpoint);
        let mut tags: Vec<String> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.matches(path)) {
            push_unique(&mut tags, &rule.tags);
        }

        if tags.is_empty()
            && let Some(derived) = derived_tag(path)
        {
            tags.push(derived);
        }
        tags
    }

    /// Tags dropped after a successful write to `endpoint`.
    pub fn invalidated_by(&self, endpoint: &str) -> Vec<String> {
        let path = strip_query(endpoint);
        let mut tags = self.tags_for(endpoint);
        for rule in self.rules.iter().filter(|r| r.matches(path)) {
            push_unique(&mut tags, &rule.invalidates);
        }
        tags
    }
}

fn strip_query(endpoint: &str) -> &str {
    endpoint.split(['?', '#']).next().unwrap_or(endpoint)
}

fn derived_tag(path: &str) -> Option<String> {
    let rest = path.trim_start_matches('/');
    let rest = rest.strip_prefix("api/").unwrap_or(rest);
    rest.split('/').find(|s| !s.is_empty()).map(str::to_string)
}

fn push_unique(into: &mut Vec<String>, tags: &[String]) {
    for tag in tags {
        if !into.contains(tag) {
            into.push(tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> TagRules {
        TagRules::new(default_tag_rules())
    }

    #[test]
    fn test_tags_for_exact_prefix() {
        assert_eq!(rules().tags_for("/api/tasks"), vec!["tasks"]);
    }

    #[test]
    fn test_tags_for_query_and_child() {
        assert_eq!(rules().tags_for("/api/tasks?status=pending"), vec!["tasks"]);
        assert_eq!(rules().tags_for("/api/tasks/12"), vec!["tasks"]);
        assert_eq!(rules().tags_for("/api/warehouse/products/3"), vec!["products"]);
    }

    #[test]
    fn test_prefix_respects_segment_boundary() {
        let rules = TagRules::new(vec![TagRule::new("/api/task", &["task"], &[])]);
        assert_eq!(rules.tags_for("/api/tasks"), vec!["tasks"]);
    }

    #[test]
    fn test_tags_for_derived_fallback() {
        assert_eq!(rules().tags_for("/api/ai/chat"), vec!["ai"]);
        assert_eq!(rules().tags_for("/health"), vec!["health"]);
        assert!(rules().tags_for("/").is_empty());
    }

    #[test]
    fn test_invalidated_by_includes_dependents() {
        let tags = rules().invalidated_by("/api/warehouse/movements");
        assert_eq!(tags, vec!["movements", "products", "transactions", "reports"]);
    }

    #[test]
    fn test_invalidated_by_task_update() {
        let tags = rules().invalidated_by("/api/tasks/5");
        assert!(tags.contains(&"tasks".to_string()));
        assert!(tags.contains(&"reports".to_string()));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: TagRule = serde_json::from_str(r#"{"prefix":"/api/orders"}"#).unwrap();
        assert_eq!(rule.prefix, "/api/orders");
        assert!(rule.tags.is_empty());
        assert!(rule.invalidates.is_empty());
    }
}
