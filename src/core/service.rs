//! Knowledge service - Typed facade over a knowledge store
//!
//! Constructed with an injected store; no process-wide instance.
//!
//! Every operation logs failures at this boundary and hands back a
//! `StoreResult`, so callers can tell "no results" apart from "request
//! failed". Combined reads (search, analytics, context lookup) never fail as
//! a whole: parts that fail come back empty and are listed in `failures`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::collection::{Collection, SearchFilter, CATEGORIES_TABLE, CHAT_CONTEXT_TABLE, DEFAULT_SEARCH_LIMIT};
use super::context::{extract_keywords, rank, ContextResult};
use super::entity::{
    Category, ChatContextEntry, FaqItem, FaqUpdate, KnowledgeItem, KnowledgeUpdate, NewCategory,
    NewChatContext, NewFaq, NewKnowledge, NewPractice, PracticeItem, PracticeUpdate,
};
use super::error::{QueryFailure, StoreResult};
use super::store::KnowledgeStore;
use crate::config::{Config, ContextConfig};

/// Activity tag used for chat context log entries
pub const CHAT_QUERY_ACTIVITY: &str = "chat_query";

/// Limits applied by the service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Rows returned per collection by `search`
    pub search_limit: usize,
    /// Chat context entries surfaced by `analytics`
    pub recent_activity_limit: usize,
    pub context: ContextConfig,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
            recent_activity_limit: 10,
            context: ContextConfig::default(),
        }
    }
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            search_limit: config.search.per_collection_limit,
            recent_activity_limit: config.analytics.recent_activity_limit,
            context: config.context.clone(),
        }
    }
}

/// Result of a soft delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// A row was marked inactive
    Deactivated,
    /// No row has that id; nothing changed
    NoMatch,
}

/// Combined search over the three collections
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub knowledge: Vec<KnowledgeItem>,
    pub faqs: Vec<FaqItem>,
    pub practices: Vec<PracticeItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<QueryFailure>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.knowledge.len() + self.faqs.len() + self.practices.len()
    }

    /// True when every sub-query succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len_of(&self, collection: Collection) -> usize {
        match collection {
            Collection::Knowledge => self.knowledge.len(),
            Collection::Faqs => self.faqs.len(),
            Collection::Practices => self.practices.len(),
        }
    }
}

/// Category entry in analytics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    /// Not aggregated yet; always 0
    pub count: u64,
}

/// Recent activity entry in analytics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatContextEntry> for ActivityEntry {
    fn from(entry: ChatContextEntry) -> Self {
        let category = entry
            .category_matched
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "uncategorized".to_string());

        Self {
            kind: CHAT_QUERY_ACTIVITY,
            title: format!("Query in {}", category),
            created_at: entry.created_at,
        }
    }
}

/// Aggregate counts and recent activity
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analytics {
    pub total_knowledge: u64,
    pub total_faqs: u64,
    pub total_practices: u64,
    pub top_categories: Vec<CategoryCount>,
    pub recent_activity: Vec<ActivityEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<QueryFailure>,
}

/// Facade over a knowledge store
#[derive(Clone)]
pub struct KnowledgeService {
    store: Arc<dyn KnowledgeStore>,
    settings: ServiceSettings,
}

impl KnowledgeService {
    pub fn new(store: Arc<dyn KnowledgeStore>, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    // ============== Categories ==============

    pub async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        logged("list categories", self.store.list_categories().await)
    }

    pub async fn add_category(&self, category: NewCategory) -> StoreResult<Category> {
        logged("add category", self.store.add_category(category).await)
    }

    // ============== Create / update ==============

    pub async fn add_knowledge(&self, item: NewKnowledge) -> StoreResult<KnowledgeItem> {
        logged("add knowledge", self.store.add_knowledge(item).await)
    }

    pub async fn add_faq(&self, item: NewFaq) -> StoreResult<FaqItem> {
        logged("add faq", self.store.add_faq(item).await)
    }

    pub async fn add_practice(&self, item: NewPractice) -> StoreResult<PracticeItem> {
        logged("add practice", self.store.add_practice(item).await)
    }

    pub async fn update_knowledge(&self, id: &str, update: KnowledgeUpdate) -> StoreResult<KnowledgeItem> {
        logged("update knowledge", self.store.update_knowledge(id, update).await)
    }

    pub async fn update_faq(&self, id: &str, update: FaqUpdate) -> StoreResult<FaqItem> {
        logged("update faq", self.store.update_faq(id, update).await)
    }

    pub async fn update_practice(&self, id: &str, update: PracticeUpdate) -> StoreResult<PracticeItem> {
        logged("update practice", self.store.update_practice(id, update).await)
    }

    // ============== Soft delete ==============

    /// Mark an item inactive. An unknown id is not an error.
    pub async fn soft_delete(&self, collection: Collection, id: &str) -> StoreResult<DeleteOutcome> {
        let updated = logged("soft delete", self.store.soft_delete(collection, id).await)?;
        if updated == 0 {
            debug!(%collection, id, "soft delete matched no row");
            return Ok(DeleteOutcome::NoMatch);
        }
        Ok(DeleteOutcome::Deactivated)
    }

    pub async fn delete_knowledge(&self, id: &str) -> StoreResult<DeleteOutcome> {
        self.soft_delete(Collection::Knowledge, id).await
    }

    pub async fn delete_faq(&self, id: &str) -> StoreResult<DeleteOutcome> {
        self.soft_delete(Collection::Faqs, id).await
    }

    pub async fn delete_practice(&self, id: &str) -> StoreResult<DeleteOutcome> {
        self.soft_delete(Collection::Practices, id).await
    }

    // ============== Search ==============

    /// Search all three collections concurrently
    ///
    /// A blank query lists the newest active rows. `category_id` narrows
    /// every collection the same way.
    pub async fn search(&self, query: &str, category_id: Option<&str>) -> SearchResults {
        let filter = SearchFilter::text(query, self.settings.search_limit).with_category(category_id);
        debug!(?filter, store = self.store.name(), "search");

        let (knowledge, faqs, practices) = tokio::join!(
            self.store.search_knowledge(&filter),
            self.store.search_faqs(&filter),
            self.store.search_practices(&filter),
        );

        let mut failures = Vec::new();
        SearchResults {
            knowledge: contain(Collection::Knowledge.table(), knowledge, &mut failures),
            faqs: contain(Collection::Faqs.table(), faqs, &mut failures),
            practices: contain(Collection::Practices.table(), practices, &mut failures),
            failures,
        }
    }

    // ============== Analytics ==============

    /// Active counts, category names and recent chat activity
    pub async fn analytics(&self) -> Analytics {
        let (knowledge, faqs, practices, names, recent) = tokio::join!(
            self.store.count_active(Collection::Knowledge),
            self.store.count_active(Collection::Faqs),
            self.store.count_active(Collection::Practices),
            self.store.category_names(),
            self.store.recent_chat_context(self.settings.recent_activity_limit),
        );

        let mut failures = Vec::new();
        let total_knowledge = contain(Collection::Knowledge.table(), knowledge, &mut failures);
        let total_faqs = contain(Collection::Faqs.table(), faqs, &mut failures);
        let total_practices = contain(Collection::Practices.table(), practices, &mut failures);
        let names = contain(CATEGORIES_TABLE, names, &mut failures);
        let recent = contain(CHAT_CONTEXT_TABLE, recent, &mut failures);

        Analytics {
            total_knowledge,
            total_faqs,
            total_practices,
            top_categories: names
                .into_iter()
                .map(|name| CategoryCount { name, count: 0 })
                .collect(),
            recent_activity: recent.into_iter().map(ActivityEntry::from).collect(),
            failures,
        }
    }

    // ============== Chatbot support ==============

    /// Record that an FAQ answered a question
    pub async fn record_faq_usage(&self, id: &str) -> StoreResult<FaqItem> {
        logged("record faq usage", self.store.increment_faq_usage(id).await)
    }

    /// Items relevant to a free-text question
    pub async fn relevant_context(&self, query: &str) -> ContextResult {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            debug!(query, "no keywords; skipping context lookup");
            return ContextResult::default();
        }

        let settings = &self.settings.context;
        let filter = SearchFilter::any_of(&keywords, settings.candidate_limit);
        debug!(?keywords, "context lookup");

        let (knowledge, faqs, practices) = tokio::join!(
            self.store.search_knowledge(&filter),
            self.store.search_faqs(&filter),
            self.store.search_practices(&filter),
        );

        let mut failures = Vec::new();
        let knowledge = contain(Collection::Knowledge.table(), knowledge, &mut failures);
        let faqs = contain(Collection::Faqs.table(), faqs, &mut failures);
        let practices = contain(Collection::Practices.table(), practices, &mut failures);

        let result = ContextResult::new(
            rank(&keywords, knowledge, settings.min_score, settings.top_k),
            rank(&keywords, faqs, settings.min_score, settings.top_k),
            rank(&keywords, practices, settings.min_score, settings.top_k),
            failures,
        );
        debug!(
            knowledge = result.knowledge.len(),
            faqs = result.faqs.len(),
            practices = result.practices.len(),
            confidence = result.confidence_score,
            "context lookup done"
        );
        result
    }

    /// Append a chat context entry for analytics
    pub async fn log_context_usage(&self, entry: NewChatContext) -> StoreResult<ChatContextEntry> {
        logged("log context usage", self.store.log_chat_context(entry).await)
    }
}

/// Log a failed operation at the facade boundary
fn logged<T>(operation: &'static str, result: StoreResult<T>) -> StoreResult<T> {
    if let Err(ref e) = result {
        error!(operation, error = %e, "knowledge store operation failed");
    }
    result
}

/// Keep a sub-query's value, or record its failure and fall back to empty
fn contain<T: Default>(source: &'static str, result: StoreResult<T>, failures: &mut Vec<QueryFailure>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(source, error = %e, "sub-query failed; continuing with partial results");
            failures.push(QueryFailure::new(source, &e));
            T::default()
        }
    }
}
