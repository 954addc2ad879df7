//! Knowledge store abstraction
//!
//! One async interface over the embedded SQLite store and the hosted data
//! API.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │           KnowledgeStore             │
//! │  ┌──────────────┬────────────────┐   │
//! │  │  LocalStore  │  RemoteStore   │   │
//! │  │  (Storage)   │ (DataApiClient)│   │
//! │  └──────────────┴────────────────┘   │
//! └──────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use super::collection::{Collection, SearchFilter, CATEGORIES_TABLE, CHAT_CONTEXT_TABLE};
use super::entity::{
    Category, ChatContextEntry, FaqItem, FaqUpdate, KnowledgeItem, KnowledgeUpdate, NewCategory,
    NewChatContext, NewFaq, NewKnowledge, NewPractice, PracticeItem, PracticeUpdate,
};
use super::error::{StoreError, StoreResult};
use super::storage::Storage;
use crate::config::{BackendKind, Config};
use crate::remote::{DataApiClient, Query};

/// Data access operations over the knowledge collections
///
/// Implemented by LocalStore (SQLite) and RemoteStore (hosted data API).
/// Implementations report failures as `StoreError`; containment and logging
/// happen in the service facade.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// All categories, sorted by name
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn add_category(&self, category: NewCategory) -> StoreResult<Category>;

    async fn add_knowledge(&self, item: NewKnowledge) -> StoreResult<KnowledgeItem>;

    async fn add_faq(&self, item: NewFaq) -> StoreResult<FaqItem>;

    async fn add_practice(&self, item: NewPractice) -> StoreResult<PracticeItem>;

    async fn update_knowledge(&self, id: &str, update: KnowledgeUpdate) -> StoreResult<KnowledgeItem>;

    async fn update_faq(&self, id: &str, update: FaqUpdate) -> StoreResult<FaqItem>;

    async fn update_practice(&self, id: &str, update: PracticeUpdate) -> StoreResult<PracticeItem>;

    /// Set `is_active = false`; returns the number of rows touched
    async fn soft_delete(&self, collection: Collection, id: &str) -> StoreResult<usize>;

    async fn search_knowledge(&self, filter: &SearchFilter) -> StoreResult<Vec<KnowledgeItem>>;

    async fn search_faqs(&self, filter: &SearchFilter) -> StoreResult<Vec<FaqItem>>;

    async fn search_practices(&self, filter: &SearchFilter) -> StoreResult<Vec<PracticeItem>>;

    async fn count_active(&self, collection: Collection) -> StoreResult<u64>;

    async fn category_names(&self) -> StoreResult<Vec<String>>;

    /// Newest chat context entries first
    async fn recent_chat_context(&self, limit: usize) -> StoreResult<Vec<ChatContextEntry>>;

    async fn log_chat_context(&self, entry: NewChatContext) -> StoreResult<ChatContextEntry>;

    /// Bump an active FAQ's usage counter
    async fn increment_faq_usage(&self, id: &str) -> StoreResult<FaqItem>;

    /// Lookups by id, active or not
    async fn get_knowledge(&self, id: &str) -> StoreResult<Option<KnowledgeItem>>;

    async fn get_faq(&self, id: &str) -> StoreResult<Option<FaqItem>>;

    async fn get_practice(&self, id: &str) -> StoreResult<Option<PracticeItem>>;

    /// Human-readable name
    fn name(&self) -> &str;
}

/// Open the store selected by config
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KnowledgeStore>> {
    match config.store.backend {
        BackendKind::Sqlite => {
            let path = config.data_dir();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let store = LocalStore::open(path.clone())
                .with_context(|| format!("Failed to open database at {}", path.display()))?;
            Ok(Arc::new(store))
        }
        BackendKind::Remote => {
            let client = DataApiClient::from_config(&config.store)
                .context("Failed to create data service client")?;
            Ok(Arc::new(RemoteStore::new(client)))
        }
    }
}

// ============== Local ==============

/// Local knowledge store (SQLite)
///
/// The connection sits behind a mutex; each call runs on the blocking pool
/// so concurrent callers serialize at the connection, not the runtime.
pub struct LocalStore {
    storage: Arc<Mutex<Storage>>,
    name: String,
}

impl LocalStore {
    /// Open a local store from a database path
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        let storage = Storage::open(&path)?;
        let name = path.display().to_string();
        Ok(Self::from_storage(storage, name))
    }

    /// Fresh in-memory store
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::from_storage(Storage::open_memory()?, "memory"))
    }

    pub fn from_storage(storage: Storage, name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            name: name.into(),
        }
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> StoreResult<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage.lock().map_err(|_| StoreError::Lock)?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl KnowledgeStore for LocalStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        self.run(|s| s.list_categories()).await
    }

    async fn add_category(&self, category: NewCategory) -> StoreResult<Category> {
        self.run(move |s| s.insert_category(&category)).await
    }

    async fn add_knowledge(&self, item: NewKnowledge) -> StoreResult<KnowledgeItem> {
        self.run(move |s| s.insert_knowledge(&item)).await
    }

    async fn add_faq(&self, item: NewFaq) -> StoreResult<FaqItem> {
        self.run(move |s| s.insert_faq(&item)).await
    }

    async fn add_practice(&self, item: NewPractice) -> StoreResult<PracticeItem> {
        self.run(move |s| s.insert_practice(&item)).await
    }

    async fn update_knowledge(&self, id: &str, update: KnowledgeUpdate) -> StoreResult<KnowledgeItem> {
        let id = id.to_string();
        self.run(move |s| s.update_knowledge(&id, &update)).await
    }

    async fn update_faq(&self, id: &str, update: FaqUpdate) -> StoreResult<FaqItem> {
        let id = id.to_string();
        self.run(move |s| s.update_faq(&id, &update)).await
    }

    async fn update_practice(&self, id: &str, update: PracticeUpdate) -> StoreResult<PracticeItem> {
        let id = id.to_string();
        self.run(move |s| s.update_practice(&id, &update)).await
    }

    async fn soft_delete(&self, collection: Collection, id: &str) -> StoreResult<usize> {
        let id = id.to_string();
        self.run(move |s| s.soft_delete(collection, &id)).await
    }

    async fn search_knowledge(&self, filter: &SearchFilter) -> StoreResult<Vec<KnowledgeItem>> {
        let filter = filter.clone();
        self.run(move |s| s.search_knowledge(&filter)).await
    }

    async fn search_faqs(&self, filter: &SearchFilter) -> StoreResult<Vec<FaqItem>> {
        let filter = filter.clone();
        self.run(move |s| s.search_faqs(&filter)).await
    }

    async fn search_practices(&self, filter: &SearchFilter) -> StoreResult<Vec<PracticeItem>> {
        let filter = filter.clone();
        self.run(move |s| s.search_practices(&filter)).await
    }

    async fn count_active(&self, collection: Collection) -> StoreResult<u64> {
        self.run(move |s| s.count_active(collection)).await
    }

    async fn category_names(&self) -> StoreResult<Vec<String>> {
        self.run(|s| s.category_names()).await
    }

    async fn recent_chat_context(&self, limit: usize) -> StoreResult<Vec<ChatContextEntry>> {
        self.run(move |s| s.recent_chat_context(limit)).await
    }

    async fn log_chat_context(&self, entry: NewChatContext) -> StoreResult<ChatContextEntry> {
        self.run(move |s| s.insert_chat_context(&entry)).await
    }

    async fn increment_faq_usage(&self, id: &str) -> StoreResult<FaqItem> {
        let id = id.to_string();
        self.run(move |s| {
            s.increment_faq_usage(&id)?.ok_or_else(|| StoreError::NotFound {
                collection: Collection::Faqs.noun(),
                id: id.clone(),
            })
        })
        .await
    }

    async fn get_knowledge(&self, id: &str) -> StoreResult<Option<KnowledgeItem>> {
        let id = id.to_string();
        self.run(move |s| s.get_knowledge(&id)).await
    }

    async fn get_faq(&self, id: &str) -> StoreResult<Option<FaqItem>> {
        let id = id.to_string();
        self.run(move |s| s.get_faq(&id)).await
    }

    async fn get_practice(&self, id: &str) -> StoreResult<Option<PracticeItem>> {
        let id = id.to_string();
        self.run(move |s| s.get_practice(&id)).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============== Remote ==============

/// Remote knowledge store (hosted data API)
pub struct RemoteStore {
    client: DataApiClient,
    name: String,
}

/// PATCH body: the partial update plus a fresh `updated_at`
#[derive(Serialize)]
struct Stamped<'a, U: Serialize> {
    #[serde(flatten)]
    fields: &'a U,
    updated_at: String,
}

#[derive(Serialize)]
struct Deactivate {
    is_active: bool,
    updated_at: String,
}

#[derive(Serialize)]
struct UsageCount {
    usage_count: u64,
    updated_at: String,
}

#[derive(serde::Deserialize)]
struct NameRow {
    name: String,
}

/// Row filter for writes to a single item
fn by_id(id: &str) -> Query {
    Query::new().eq("id", id)
}

impl RemoteStore {
    pub fn new(client: DataApiClient) -> Self {
        let name = client.base_url().to_string();
        Self { client, name }
    }

    async fn update_one<U, T>(&self, collection: Collection, id: &str, update: &U) -> StoreResult<T>
    where
        U: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let body = Stamped {
            fields: update,
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut rows: Vec<T> = self
            .client
            .update(collection.table(), &by_id(id), &body)
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound {
                collection: collection.noun(),
                id: id.to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn get_one<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<T>> {
        let query = Query::new().select("*").eq("id", id).limit(1);
        let rows: Vec<T> = self.client.select(collection.table(), &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn search<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &SearchFilter,
    ) -> StoreResult<Vec<T>> {
        let query = Query::for_search(collection.text_fields(), filter);
        self.client.select(collection.table(), &query).await
    }
}

#[async_trait]
impl KnowledgeStore for RemoteStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let query = Query::new().select("*").order("name", true);
        self.client.select(CATEGORIES_TABLE, &query).await
    }

    async fn add_category(&self, category: NewCategory) -> StoreResult<Category> {
        self.client.insert(CATEGORIES_TABLE, &category).await
    }

    async fn add_knowledge(&self, item: NewKnowledge) -> StoreResult<KnowledgeItem> {
        self.client.insert(Collection::Knowledge.table(), &item).await
    }

    async fn add_faq(&self, item: NewFaq) -> StoreResult<FaqItem> {
        self.client.insert(Collection::Faqs.table(), &item).await
    }

    async fn add_practice(&self, item: NewPractice) -> StoreResult<PracticeItem> {
        self.client.insert(Collection::Practices.table(), &item).await
    }

    async fn update_knowledge(&self, id: &str, update: KnowledgeUpdate) -> StoreResult<KnowledgeItem> {
        self.update_one(Collection::Knowledge, id, &update).await
    }

    async fn update_faq(&self, id: &str, update: FaqUpdate) -> StoreResult<FaqItem> {
        self.update_one(Collection::Faqs, id, &update).await
    }

    async fn update_practice(&self, id: &str, update: PracticeUpdate) -> StoreResult<PracticeItem> {
        self.update_one(Collection::Practices, id, &update).await
    }

    async fn soft_delete(&self, collection: Collection, id: &str) -> StoreResult<usize> {
        let body = Deactivate {
            is_active: false,
            updated_at: Utc::now().to_rfc3339(),
        };
        let rows: Vec<serde::de::IgnoredAny> = self
            .client
            .update(collection.table(), &by_id(id), &body)
            .await?;
        Ok(rows.len())
    }

    async fn search_knowledge(&self, filter: &SearchFilter) -> StoreResult<Vec<KnowledgeItem>> {
        self.search(Collection::Knowledge, filter).await
    }

    async fn search_faqs(&self, filter: &SearchFilter) -> StoreResult<Vec<FaqItem>> {
        self.search(Collection::Faqs, filter).await
    }

    async fn search_practices(&self, filter: &SearchFilter) -> StoreResult<Vec<PracticeItem>> {
        self.search(Collection::Practices, filter).await
    }

    async fn count_active(&self, collection: Collection) -> StoreResult<u64> {
        let query = Query::new().select("id").is("is_active", true);
        self.client.count(collection.table(), &query).await
    }

    async fn category_names(&self) -> StoreResult<Vec<String>> {
        let query = Query::new().select("name").order("name", true);
        let rows: Vec<NameRow> = self.client.select(CATEGORIES_TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn recent_chat_context(&self, limit: usize) -> StoreResult<Vec<ChatContextEntry>> {
        let query = Query::new()
            .select("*")
            .order("created_at", false)
            .limit(limit);
        self.client.select(CHAT_CONTEXT_TABLE, &query).await
    }

    async fn log_chat_context(&self, entry: NewChatContext) -> StoreResult<ChatContextEntry> {
        self.client.insert(CHAT_CONTEXT_TABLE, &entry).await
    }

    async fn increment_faq_usage(&self, id: &str) -> StoreResult<FaqItem> {
        // No atomic increment over plain REST: read, then write the next value.
        let table = Collection::Faqs.table();
        let query = Query::new()
            .select("*")
            .eq("id", id)
            .is("is_active", true)
            .limit(1);
        let current: Vec<FaqItem> = self.client.select(table, &query).await?;
        let faq = current.into_iter().next().ok_or_else(|| StoreError::NotFound {
            collection: Collection::Faqs.noun(),
            id: id.to_string(),
        })?;

        let body = UsageCount {
            usage_count: faq.usage_count + 1,
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut rows: Vec<FaqItem> = self
            .client
            .update(table, &by_id(id), &body)
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound {
                collection: Collection::Faqs.noun(),
                id: id.to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn get_knowledge(&self, id: &str) -> StoreResult<Option<KnowledgeItem>> {
        self.get_one(Collection::Knowledge, id).await
    }

    async fn get_faq(&self, id: &str) -> StoreResult<Option<FaqItem>> {
        self.get_one(Collection::Faqs, id).await
    }

    async fn get_practice(&self, id: &str) -> StoreResult<Option<PracticeItem>> {
        self.get_one(Collection::Practices, id).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
