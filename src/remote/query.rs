//! PostgREST query builder
//!
//! Builds the query-string pairs for the hosted data API. Top-level `eq`
//! values are sent bare; the whole pair is percent-encoded and PostgREST
//! reads everything after `eq.` as the value. Values inside `or=(...)` are
//! double-quoted with `\` and `"` escaped, so commas, parentheses and dots
//! in user text cannot change the filter tree. Substring search uses
//! the case-insensitive regex operator with every regex metacharacter
//! escaped, which avoids the `*` wildcard rewriting PostgREST applies to
//! LIKE patterns.

use crate::core::collection::SearchFilter;

/// Ordered list of query-string pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return
    pub fn select(mut self, columns: &str) -> Self {
        self.pairs.push(("select".to_string(), columns.to_string()));
        self
    }

    /// `column = value`
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.pairs.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// `column = true|false`
    pub fn is(mut self, column: &str, value: bool) -> Self {
        self.pairs.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// OR of case-insensitive substring matches of every term over every column
    pub fn any_contains(mut self, columns: &[&str], terms: &[String]) -> Self {
        if columns.is_empty() || terms.is_empty() {
            return self;
        }

        let predicates: Vec<String> = terms
            .iter()
            .flat_map(|term| {
                let pattern = quote_value(&regex_escape(term));
                columns
                    .iter()
                    .map(move |column| format!("{}.imatch.{}", column, pattern))
            })
            .collect();

        self.pairs
            .push(("or".to_string(), format!("({})", predicates.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.pairs
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.pairs.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// Active rows matching a collection search filter
    pub fn for_search(columns: &[&str], filter: &SearchFilter) -> Self {
        let mut query = Self::new()
            .select("*")
            .is("is_active", true)
            .any_contains(columns, &filter.terms);

        if let Some(category_id) = &filter.category_id {
            query = query.eq("category_id", category_id);
        }

        query.order("created_at", false).limit(filter.limit)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Double-quote a value for a filter list, escaping `\` and `"`
pub fn quote_value(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if matches!(c, '\\' | '"') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Escape POSIX regex metacharacters so the term matches literally
pub fn regex_escape(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if c.is_ascii_punctuation() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
        query
            .pairs()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_search_query_shape() {
        let filter = SearchFilter::text("pH", 10).with_category(Some("soil"));
        let query = Query::for_search(&["title", "content", "summary"], &filter);

        assert_eq!(value_of(&query, "select"), Some("*"));
        assert_eq!(value_of(&query, "is_active"), Some("eq.true"));
        assert_eq!(
            value_of(&query, "or"),
            Some(r#"(title.imatch."pH",content.imatch."pH",summary.imatch."pH")"#)
        );
        assert_eq!(value_of(&query, "category_id"), Some("eq.soil"));
        assert_eq!(value_of(&query, "limit"), Some("10"));
    }

    #[test]
    fn test_empty_query_has_no_or_filter() {
        let filter = SearchFilter::text("", 10);
        let query = Query::for_search(&["question", "answer"], &filter);
        assert_eq!(value_of(&query, "or"), None);
    }

    #[test]
    fn test_filter_syntax_in_user_text_is_inert() {
        let filter = SearchFilter::text(r#"a),is_active.eq.false,(b"#, 10);
        let query = Query::for_search(&["question"], &filter);

        // The whole term stays inside one quoted, regex-escaped value
        assert_eq!(
            value_of(&query, "or"),
            Some(r#"(question.imatch."a\\)\\,is\\_active\\.eq\\.false\\,\\(b")"#)
        );
    }

    #[test]
    fn test_eq_value_is_bare() {
        let query = Query::new().eq("id", "01HQ3K2JN5");
        assert_eq!(value_of(&query, "id"), Some("eq.01HQ3K2JN5"));

        // Quotes in a top-level value are part of the value
        let query = Query::new().eq("category_id", r#"a"b"#);
        assert_eq!(value_of(&query, "category_id"), Some(r#"eq.a"b"#));
    }

    #[test]
    fn test_quote_and_regex_escaping() {
        assert_eq!(quote_value(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_value(r"back\slash"), r#""back\\slash""#);
        assert_eq!(regex_escape("50%_off*"), r"50\%\_off\*");
        assert_eq!(regex_escape("maize"), "maize");
    }

    #[test]
    fn test_escaped_backslash_survives_quoting() {
        let pattern = quote_value(&regex_escape("a.b"));
        assert_eq!(pattern, r#""a\\.b""#);
    }
}
