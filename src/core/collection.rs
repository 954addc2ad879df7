//! Collections - Named record sets in the data service
//!
//! Maps each searchable item type to its table and the text fields the
//! substring search runs over.

use serde::Serialize;

/// Category lookup table (not soft-deletable)
pub const CATEGORIES_TABLE: &str = "agricultural_categories";

/// Chat context log table (append-only)
pub const CHAT_CONTEXT_TABLE: &str = "chat_context_log";

/// Default cap on rows returned per collection by a search
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// One of the three soft-deletable item collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Knowledge,
    Faqs,
    Practices,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Knowledge,
        Collection::Faqs,
        Collection::Practices,
    ];

    /// Table name in the data service
    pub fn table(self) -> &'static str {
        match self {
            Collection::Knowledge => "agricultural_knowledge",
            Collection::Faqs => "agricultural_faqs",
            Collection::Practices => "agricultural_practices",
        }
    }

    /// Text fields matched by search, in predicate order
    pub fn text_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Knowledge => &["title", "content", "summary"],
            Collection::Faqs => &["question", "answer"],
            Collection::Practices => &["practice_name", "description"],
        }
    }

    /// Singular noun for messages
    pub fn noun(self) -> &'static str {
        match self {
            Collection::Knowledge => "knowledge item",
            Collection::Faqs => "FAQ",
            Collection::Practices => "practice",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Knowledge => write!(f, "knowledge"),
            Collection::Faqs => write!(f, "faqs"),
            Collection::Practices => write!(f, "practices"),
        }
    }
}

impl std::str::FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "knowledge" | "article" | "articles" => Ok(Collection::Knowledge),
            "faq" | "faqs" => Ok(Collection::Faqs),
            "practice" | "practices" => Ok(Collection::Practices),
            _ => anyhow::bail!(
                "Unknown collection: {} (expected knowledge, faq or practice)",
                s
            ),
        }
    }
}

/// Filter for one collection search
///
/// Terms are OR-ed across the collection's text fields as case-insensitive
/// substring matches. No terms means no text predicate. Backends must bind
/// terms as values, never splice them into filter syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub terms: Vec<String>,
    pub category_id: Option<String>,
    pub limit: usize,
}

impl SearchFilter {
    /// Single free-text query; blank text lists everything
    pub fn text(query: &str, limit: usize) -> Self {
        let query = query.trim();
        Self {
            terms: if query.is_empty() {
                Vec::new()
            } else {
                vec![query.to_string()]
            },
            category_id: None,
            limit,
        }
    }

    /// Match any of several keywords
    pub fn any_of(terms: &[String], limit: usize) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            category_id: None,
            limit,
        }
    }

    /// Narrow to a category; an empty id means "all categories"
    pub fn with_category(mut self, category_id: Option<&str>) -> Self {
        self.category_id = category_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_aliases() {
        assert_eq!("FAQ".parse::<Collection>().unwrap(), Collection::Faqs);
        assert_eq!(
            "practice".parse::<Collection>().unwrap(),
            Collection::Practices
        );
        assert!("forum".parse::<Collection>().is_err());
    }

    #[test]
    fn test_blank_query_has_no_terms() {
        let filter = SearchFilter::text("   ", 10);
        assert!(filter.terms.is_empty());
        assert_eq!(filter.limit, 10);
    }

    #[test]
    fn test_empty_category_means_all() {
        let filter = SearchFilter::text("pH", 10).with_category(Some(""));
        assert_eq!(filter.category_id, None);

        let filter = SearchFilter::text("pH", 10).with_category(Some("soil"));
        assert_eq!(filter.category_id.as_deref(), Some("soil"));
    }
}
