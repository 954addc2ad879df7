//! Storage - SQLite backend
//!
//! Embedded implementation of the knowledge collections.
//!
//! # Key Points
//! - One table per collection, named as in the hosted data service
//! - Soft delete only: `is_active = 0` plus an `updated_at` stamp
//! - Search text is always a bound parameter; LIKE wildcards in user
//!   input are escaped so `%` and `_` match literally
//! - List fields (tags, keywords, steps, ...) are stored as JSON arrays

use std::path::{Path as FilePath, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use tracing::debug;
use ulid::Ulid;

use super::collection::{Collection, SearchFilter, CATEGORIES_TABLE, CHAT_CONTEXT_TABLE};
use super::entity::{
    Category, ChatContextEntry, DifficultyLevel, FaqItem, FaqUpdate, KnowledgeItem,
    KnowledgeUpdate, NewCategory, NewChatContext, NewFaq, NewKnowledge, NewPractice,
    PracticeItem, PracticeUpdate,
};
use super::error::{StoreError, StoreResult};

/// Database storage
pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Storage {
    /// Open or create a database
    pub fn open(path: &FilePath) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let storage = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn, path: None };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Database file, if any
    pub fn path(&self) -> Option<&FilePath> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS agricultural_categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                slug TEXT NOT NULL UNIQUE,
                parent_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agricultural_knowledge (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                category_id TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',       -- JSON array
                keywords TEXT NOT NULL DEFAULT '[]',   -- JSON array
                difficulty_level TEXT NOT NULL DEFAULT 'beginner',
                region TEXT,
                crop_type TEXT,
                season TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agricultural_faqs (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                category_id TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                keywords TEXT NOT NULL DEFAULT '[]',
                region TEXT,
                crop_type TEXT,
                difficulty_level TEXT NOT NULL DEFAULT 'beginner',
                usage_count INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agricultural_practices (
                id TEXT PRIMARY KEY,
                practice_name TEXT NOT NULL,
                description TEXT NOT NULL,
                steps TEXT NOT NULL DEFAULT '[]',
                benefits TEXT NOT NULL DEFAULT '[]',
                requirements TEXT NOT NULL DEFAULT '[]',
                category_id TEXT NOT NULL,
                crop_type TEXT,
                season TEXT,
                region TEXT,
                difficulty_level TEXT NOT NULL DEFAULT 'beginner',
                tags TEXT NOT NULL DEFAULT '[]',
                keywords TEXT NOT NULL DEFAULT '[]',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_context_log (
                id TEXT PRIMARY KEY,
                user_query TEXT NOT NULL,
                context_used TEXT NOT NULL DEFAULT '[]',
                response_generated TEXT NOT NULL DEFAULT '',
                category_matched TEXT,
                confidence_score REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_knowledge_active ON agricultural_knowledge(is_active, category_id);
            CREATE INDEX IF NOT EXISTS idx_faqs_active ON agricultural_faqs(is_active, category_id);
            CREATE INDEX IF NOT EXISTS idx_practices_active ON agricultural_practices(is_active, category_id);
            CREATE INDEX IF NOT EXISTS idx_chat_context_created ON chat_context_log(created_at);
            "#,
        )?;

        Ok(())
    }

    // ============== Categories ==============

    /// All categories, ordered by name
    pub fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM agricultural_categories ORDER BY name")?;

        let categories = stmt
            .query_map([], Self::row_to_category)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Category names only, ordered by name
    pub fn category_names(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM agricultural_categories ORDER BY name")?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    pub fn insert_category(&self, category: &NewCategory) -> StoreResult<Category> {
        let id = Ulid::new().to_string();

        self.conn.execute(
            "INSERT INTO agricultural_categories (id, name, description, slug, parent_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                category.name,
                category.description,
                category.slug,
                category.parent_id,
                now(),
            ],
        )?;

        let sql = format!("SELECT * FROM {} WHERE id = ?1", CATEGORIES_TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row([&id], Self::row_to_category)?)
    }

    // ============== Inserts ==============

    pub fn insert_knowledge(&self, item: &NewKnowledge) -> StoreResult<KnowledgeItem> {
        let id = Ulid::new().to_string();
        let now = now();

        self.conn.execute(
            r#"
            INSERT INTO agricultural_knowledge (
                id, title, content, summary, category_id, tags, keywords,
                difficulty_level, region, crop_type, season, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)
            "#,
            params![
                id,
                item.title,
                item.content,
                item.summary,
                item.category_id,
                serde_json::to_string(&item.tags)?,
                serde_json::to_string(&item.keywords)?,
                item.difficulty_level.to_string(),
                item.region,
                item.crop_type,
                item.season,
                now,
            ],
        )?;

        self.get_knowledge(&id)?.ok_or_else(|| not_found(Collection::Knowledge, &id))
    }

    pub fn insert_faq(&self, item: &NewFaq) -> StoreResult<FaqItem> {
        let id = Ulid::new().to_string();
        let now = now();

        self.conn.execute(
            r#"
            INSERT INTO agricultural_faqs (
                id, question, answer, category_id, tags, keywords, region,
                crop_type, difficulty_level, usage_count, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, 1, ?10, ?10)
            "#,
            params![
                id,
                item.question,
                item.answer,
                item.category_id,
                serde_json::to_string(&item.tags)?,
                serde_json::to_string(&item.keywords)?,
                item.region,
                item.crop_type,
                item.difficulty_level.to_string(),
                now,
            ],
        )?;

        self.get_faq(&id)?.ok_or_else(|| not_found(Collection::Faqs, &id))
    }

    pub fn insert_practice(&self, item: &NewPractice) -> StoreResult<PracticeItem> {
        let id = Ulid::new().to_string();
        let now = now();

        self.conn.execute(
            r#"
            INSERT INTO agricultural_practices (
                id, practice_name, description, steps, benefits, requirements,
                category_id, crop_type, season, region, difficulty_level,
                tags, keywords, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1, ?14, ?14)
            "#,
            params![
                id,
                item.practice_name,
                item.description,
                serde_json::to_string(&item.steps)?,
                serde_json::to_string(&item.benefits)?,
                serde_json::to_string(&item.requirements)?,
                item.category_id,
                item.crop_type,
                item.season,
                item.region,
                item.difficulty_level.to_string(),
                serde_json::to_string(&item.tags)?,
                serde_json::to_string(&item.keywords)?,
                now,
            ],
        )?;

        self.get_practice(&id)?.ok_or_else(|| not_found(Collection::Practices, &id))
    }

    // ============== Lookups ==============

    /// Get a knowledge item by ID (active or not)
    pub fn get_knowledge(&self, id: &str) -> StoreResult<Option<KnowledgeItem>> {
        self.get_by_id(Collection::Knowledge, id, Self::row_to_knowledge)
    }

    /// Get an FAQ by ID (active or not)
    pub fn get_faq(&self, id: &str) -> StoreResult<Option<FaqItem>> {
        self.get_by_id(Collection::Faqs, id, Self::row_to_faq)
    }

    /// Get a practice by ID (active or not)
    pub fn get_practice(&self, id: &str) -> StoreResult<Option<PracticeItem>> {
        self.get_by_id(Collection::Practices, id, Self::row_to_practice)
    }

    fn get_by_id<T>(
        &self,
        collection: Collection,
        id: &str,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> StoreResult<Option<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1", collection.table());
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row([id], map) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============== Updates ==============

    pub fn update_knowledge(&self, id: &str, update: &KnowledgeUpdate) -> StoreResult<KnowledgeItem> {
        let mut set = Assignments::default();
        set.text("title", &update.title);
        set.text("content", &update.content);
        set.text("summary", &update.summary);
        set.text("category_id", &update.category_id);
        set.list("tags", &update.tags)?;
        set.list("keywords", &update.keywords)?;
        set.difficulty(&update.difficulty_level);
        set.text("region", &update.region);
        set.text("crop_type", &update.crop_type);
        set.text("season", &update.season);

        self.apply_update(Collection::Knowledge, id, set)?;
        self.get_knowledge(id)?.ok_or_else(|| not_found(Collection::Knowledge, id))
    }

    pub fn update_faq(&self, id: &str, update: &FaqUpdate) -> StoreResult<FaqItem> {
        let mut set = Assignments::default();
        set.text("question", &update.question);
        set.text("answer", &update.answer);
        set.text("category_id", &update.category_id);
        set.list("tags", &update.tags)?;
        set.list("keywords", &update.keywords)?;
        set.text("region", &update.region);
        set.text("crop_type", &update.crop_type);
        set.difficulty(&update.difficulty_level);

        self.apply_update(Collection::Faqs, id, set)?;
        self.get_faq(id)?.ok_or_else(|| not_found(Collection::Faqs, id))
    }

    pub fn update_practice(&self, id: &str, update: &PracticeUpdate) -> StoreResult<PracticeItem> {
        let mut set = Assignments::default();
        set.text("practice_name", &update.practice_name);
        set.text("description", &update.description);
        set.list("steps", &update.steps)?;
        set.list("benefits", &update.benefits)?;
        set.list("requirements", &update.requirements)?;
        set.text("category_id", &update.category_id);
        set.text("crop_type", &update.crop_type);
        set.text("season", &update.season);
        set.text("region", &update.region);
        set.difficulty(&update.difficulty_level);
        set.list("tags", &update.tags)?;
        set.list("keywords", &update.keywords)?;

        self.apply_update(Collection::Practices, id, set)?;
        self.get_practice(id)?.ok_or_else(|| not_found(Collection::Practices, id))
    }

    /// Write the supplied columns plus a fresh `updated_at`
    fn apply_update(&self, collection: Collection, id: &str, set: Assignments) -> StoreResult<()> {
        let mut clauses = Vec::with_capacity(set.0.len() + 1);
        let mut values = Vec::with_capacity(set.0.len() + 2);

        for (column, value) in set.0 {
            values.push(value);
            clauses.push(format!("{} = ?{}", column, values.len()));
        }
        values.push(Value::Text(now()));
        clauses.push(format!("updated_at = ?{}", values.len()));
        values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            collection.table(),
            clauses.join(", "),
            values.len()
        );

        let updated = self.conn.execute(&sql, params_from_iter(values))?;
        if updated == 0 {
            return Err(not_found(collection, id));
        }
        Ok(())
    }

    /// Mark a row inactive. Returns the number of rows touched (0 or 1).
    pub fn soft_delete(&self, collection: Collection, id: &str) -> StoreResult<usize> {
        let sql = format!(
            "UPDATE {} SET is_active = 0, updated_at = ?2 WHERE id = ?1",
            collection.table()
        );
        let updated = self.conn.execute(&sql, params![id, now()])?;
        debug!(table = collection.table(), id, updated, "soft delete");
        Ok(updated)
    }

    /// Bump an active FAQ's usage counter
    pub fn increment_faq_usage(&self, id: &str) -> StoreResult<Option<FaqItem>> {
        let updated = self.conn.execute(
            "UPDATE agricultural_faqs SET usage_count = usage_count + 1, updated_at = ?2
             WHERE id = ?1 AND is_active = 1",
            params![id, now()],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        self.get_faq(id)
    }

    // ============== Search ==============

    pub fn search_knowledge(&self, filter: &SearchFilter) -> StoreResult<Vec<KnowledgeItem>> {
        self.search_rows(Collection::Knowledge, filter, Self::row_to_knowledge)
    }

    pub fn search_faqs(&self, filter: &SearchFilter) -> StoreResult<Vec<FaqItem>> {
        self.search_rows(Collection::Faqs, filter, Self::row_to_faq)
    }

    pub fn search_practices(&self, filter: &SearchFilter) -> StoreResult<Vec<PracticeItem>> {
        self.search_rows(Collection::Practices, filter, Self::row_to_practice)
    }

    fn search_rows<T>(
        &self,
        collection: Collection,
        filter: &SearchFilter,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<T>> {
        let (sql, values) = Self::search_sql(collection, filter);
        debug!(table = collection.table(), terms = filter.terms.len(), "search");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), map)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Build the search statement. Column names come from the static
    /// collection table; every user-supplied value is a bound parameter.
    fn search_sql(collection: Collection, filter: &SearchFilter) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {} WHERE is_active = 1", collection.table());
        let mut values = Vec::new();

        if !filter.terms.is_empty() {
            let mut predicates = Vec::new();
            for term in &filter.terms {
                let pattern = like_contains(term);
                for field in collection.text_fields() {
                    values.push(Value::Text(pattern.clone()));
                    predicates.push(format!("{} LIKE ?{} ESCAPE '\\'", field, values.len()));
                }
            }
            sql.push_str(&format!(" AND ({})", predicates.join(" OR ")));
        }

        if let Some(category_id) = &filter.category_id {
            values.push(Value::Text(category_id.clone()));
            sql.push_str(&format!(" AND category_id = ?{}", values.len()));
        }

        values.push(Value::Integer(filter.limit as i64));
        sql.push_str(&format!(
            " ORDER BY created_at DESC, rowid DESC LIMIT ?{}",
            values.len()
        ));

        (sql, values)
    }

    // ============== Analytics ==============

    /// Number of active rows in a collection
    pub fn count_active(&self, collection: Collection) -> StoreResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE is_active = 1",
            collection.table()
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Newest chat context entries first
    pub fn recent_chat_context(&self, limit: usize) -> StoreResult<Vec<ChatContextEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM chat_context_log ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map([limit as i64], Self::row_to_chat_context)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn insert_chat_context(&self, entry: &NewChatContext) -> StoreResult<ChatContextEntry> {
        let id = Ulid::new().to_string();

        self.conn.execute(
            r#"
            INSERT INTO chat_context_log (
                id, user_query, context_used, response_generated,
                category_matched, confidence_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id,
                entry.user_query,
                serde_json::to_string(&entry.context_used)?,
                entry.response_generated,
                entry.category_matched,
                entry.confidence_score,
                now(),
            ],
        )?;

        let sql = format!("SELECT * FROM {} WHERE id = ?1", CHAT_CONTEXT_TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row([&id], Self::row_to_chat_context)?)
    }

    // ============== Row mapping ==============

    fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            slug: row.get("slug")?,
            parent_id: row.get("parent_id")?,
        })
    }

    fn row_to_knowledge(row: &Row) -> rusqlite::Result<KnowledgeItem> {
        Ok(KnowledgeItem {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            summary: row.get("summary")?,
            category_id: row.get("category_id")?,
            tags: json_list(row, "tags")?,
            keywords: json_list(row, "keywords")?,
            difficulty_level: difficulty(row)?,
            region: row.get("region")?,
            crop_type: row.get("crop_type")?,
            season: row.get("season")?,
            is_active: row.get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }

    fn row_to_faq(row: &Row) -> rusqlite::Result<FaqItem> {
        let usage_count: i64 = row.get("usage_count")?;

        Ok(FaqItem {
            id: row.get("id")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
            category_id: row.get("category_id")?,
            tags: json_list(row, "tags")?,
            keywords: json_list(row, "keywords")?,
            region: row.get("region")?,
            crop_type: row.get("crop_type")?,
            difficulty_level: difficulty(row)?,
            usage_count: usage_count.max(0) as u64,
            is_active: row.get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }

    fn row_to_practice(row: &Row) -> rusqlite::Result<PracticeItem> {
        Ok(PracticeItem {
            id: row.get("id")?,
            practice_name: row.get("practice_name")?,
            description: row.get("description")?,
            steps: json_list(row, "steps")?,
            benefits: json_list(row, "benefits")?,
            requirements: json_list(row, "requirements")?,
            category_id: row.get("category_id")?,
            crop_type: row.get("crop_type")?,
            season: row.get("season")?,
            region: row.get("region")?,
            difficulty_level: difficulty(row)?,
            tags: json_list(row, "tags")?,
            keywords: json_list(row, "keywords")?,
            is_active: row.get("is_active")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }

    fn row_to_chat_context(row: &Row) -> rusqlite::Result<ChatContextEntry> {
        Ok(ChatContextEntry {
            id: row.get("id")?,
            user_query: row.get("user_query")?,
            context_used: json_list(row, "context_used")?,
            response_generated: row.get("response_generated")?,
            category_matched: row.get("category_matched")?,
            confidence_score: row.get("confidence_score")?,
            created_at: timestamp(row, "created_at")?.unwrap_or_else(Utc::now),
        })
    }
}

/// Column/value pairs for a partial update
#[derive(Default)]
struct Assignments(Vec<(&'static str, Value)>);

impl Assignments {
    fn text(&mut self, column: &'static str, value: &Option<String>) {
        if let Some(v) = value {
            self.0.push((column, Value::Text(v.clone())));
        }
    }

    fn list(&mut self, column: &'static str, value: &Option<Vec<String>>) -> StoreResult<()> {
        if let Some(v) = value {
            self.0.push((column, Value::Text(serde_json::to_string(v)?)));
        }
        Ok(())
    }

    fn difficulty(&mut self, value: &Option<DifficultyLevel>) {
        if let Some(v) = value {
            self.0.push(("difficulty_level", Value::Text(v.to_string())));
        }
    }
}

/// `%term%` with LIKE metacharacters escaped (escape char `\`)
pub(crate) fn like_contains(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Fixed-width UTC stamp so text order matches time order
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn not_found(collection: Collection, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.noun(),
        id: id.to_string(),
    }
}

fn json_list(row: &Row, column: &str) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(column)?;
    Ok(raw
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default())
}

fn difficulty(row: &Row) -> rusqlite::Result<DifficultyLevel> {
    let raw: String = row.get("difficulty_level")?;
    Ok(raw.parse().unwrap_or_default())
}

fn timestamp(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knowledge(title: &str, summary: &str, category: &str) -> NewKnowledge {
        NewKnowledge {
            title: title.to_string(),
            content: format!("{} content", title),
            summary: summary.to_string(),
            category_id: category.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_assigns_id_and_active() -> StoreResult<()> {
        let storage = Storage::open_memory()?;

        let item = storage.insert_knowledge(&knowledge("Crop rotation", "Rotate crops", "c1"))?;
        assert!(!item.id.is_empty());
        assert!(item.is_active);
        assert!(item.created_at.is_some());

        let faq = storage.insert_faq(&NewFaq {
            question: "How often to water tomatoes?".to_string(),
            answer: "Twice a week.".to_string(),
            category_id: "c1".to_string(),
            ..Default::default()
        })?;
        assert_eq!(faq.usage_count, 0);
        assert!(faq.is_active);

        Ok(())
    }

    #[test]
    fn test_soft_delete_keeps_row() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        let item = storage.insert_knowledge(&knowledge("Mulching", "Keep soil moist", "c1"))?;
        assert_eq!(storage.count_active(Collection::Knowledge)?, 1);

        let updated = storage.soft_delete(Collection::Knowledge, &item.id)?;
        assert_eq!(updated, 1);

        let row = storage.get_knowledge(&item.id)?.expect("row still present");
        assert!(!row.is_active);
        assert!(row.updated_at >= item.updated_at);
        assert_eq!(storage.count_active(Collection::Knowledge)?, 0);

        Ok(())
    }

    #[test]
    fn test_soft_delete_missing_id_touches_nothing() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        assert_eq!(storage.soft_delete(Collection::Faqs, "abc")?, 0);
        Ok(())
    }

    #[test]
    fn test_search_ph_scenario() -> StoreResult<()> {
        let storage = Storage::open_memory()?;

        let active = storage.insert_knowledge(&knowledge(
            "Testing your soil",
            "Soil pH testing guide",
            "soil",
        ))?;
        let retired = storage.insert_knowledge(&knowledge("pH basics", "Old article", "soil"))?;
        storage.soft_delete(Collection::Knowledge, &retired.id)?;

        let filter = SearchFilter::text("pH", 10);
        let results = storage.search_knowledge(&filter)?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, active.id);

        assert!(storage.search_faqs(&filter)?.is_empty());
        assert!(storage.search_practices(&filter)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_search_is_case_insensitive_substring() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        storage.insert_practice(&NewPractice {
            practice_name: "Drip Irrigation".to_string(),
            description: "Deliver water to the roots".to_string(),
            steps: vec!["Lay lines".to_string(), "Install emitters".to_string()],
            category_id: "water".to_string(),
            ..Default::default()
        })?;

        let found = storage.search_practices(&SearchFilter::text("IRRIG", 10))?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].steps, vec!["Lay lines", "Install emitters"]);

        Ok(())
    }

    #[test]
    fn test_empty_query_caps_at_limit() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        for i in 0..12 {
            storage.insert_knowledge(&knowledge(&format!("Item {}", i), "", "c1"))?;
        }

        let results = storage.search_knowledge(&SearchFilter::text("", 10))?;
        assert_eq!(results.len(), 10);

        Ok(())
    }

    #[test]
    fn test_category_filter() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        storage.insert_knowledge(&knowledge("Soil pH", "", "soil"))?;
        storage.insert_knowledge(&knowledge("Pest pH", "", "pests"))?;

        let filter = SearchFilter::text("pH", 10).with_category(Some("soil"));
        let results = storage.search_knowledge(&filter)?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].category_id, "soil");

        Ok(())
    }

    #[test]
    fn test_metacharacters_are_literal() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        storage.insert_knowledge(&knowledge("Nitrogen at 50% strength", "", "c1"))?;
        storage.insert_knowledge(&knowledge("Potassium", "", "c1"))?;
        storage.insert_knowledge(&knowledge("Farmer's almanac", "", "c1"))?;

        // `%` alone would match every row if it reached LIKE unescaped
        let pct = storage.search_knowledge(&SearchFilter::text("%", 10))?;
        assert_eq!(pct.len(), 1);
        assert_eq!(pct[0].title, "Nitrogen at 50% strength");

        let underscore = storage.search_knowledge(&SearchFilter::text("_", 10))?;
        assert!(underscore.is_empty());

        let quote = storage.search_knowledge(&SearchFilter::text("' OR '1'='1", 10))?;
        assert!(quote.is_empty());

        let apostrophe = storage.search_knowledge(&SearchFilter::text("Farmer's", 10))?;
        assert_eq!(apostrophe.len(), 1);

        Ok(())
    }

    #[test]
    fn test_partial_update_merges_fields() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        let item = storage.insert_knowledge(&knowledge("Composting", "Old summary", "c1"))?;

        let updated = storage.update_knowledge(
            &item.id,
            &KnowledgeUpdate {
                summary: Some("New summary".to_string()),
                tags: Some(vec!["organic".to_string()]),
                ..Default::default()
            },
        )?;

        assert_eq!(updated.id, item.id);
        assert_eq!(updated.title, "Composting");
        assert_eq!(updated.summary, "New summary");
        assert_eq!(updated.tags, vec!["organic"]);
        assert!(updated.is_active);

        Ok(())
    }

    #[test]
    fn test_update_missing_id_is_not_found() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        let result = storage.update_faq("missing", &FaqUpdate::default());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_increment_faq_usage() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        let faq = storage.insert_faq(&NewFaq {
            question: "Q".to_string(),
            answer: "A".to_string(),
            category_id: "c1".to_string(),
            ..Default::default()
        })?;

        storage.increment_faq_usage(&faq.id)?;
        let bumped = storage.increment_faq_usage(&faq.id)?.expect("faq exists");
        assert_eq!(bumped.usage_count, 2);

        storage.soft_delete(Collection::Faqs, &faq.id)?;
        assert!(storage.increment_faq_usage(&faq.id)?.is_none());

        Ok(())
    }

    #[test]
    fn test_categories_sorted_by_name() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        storage.insert_category(&NewCategory::new("Water Management"))?;
        let soil = storage.insert_category(&NewCategory::new("Soil Health"))?;
        storage.insert_category(&NewCategory {
            parent_id: Some(soil.id.clone()),
            ..NewCategory::new("Soil Testing")
        })?;

        let names = storage.category_names()?;
        assert_eq!(names, vec!["Soil Health", "Soil Testing", "Water Management"]);

        let categories = storage.list_categories()?;
        assert_eq!(categories[1].parent_id.as_deref(), Some(soil.id.as_str()));
        assert_eq!(categories[0].slug, "soil-health");

        Ok(())
    }

    #[test]
    fn test_recent_chat_context_newest_first() -> StoreResult<()> {
        let storage = Storage::open_memory()?;
        for category in ["soil", "pests", "water"] {
            storage.insert_chat_context(&NewChatContext {
                user_query: format!("question about {}", category),
                category_matched: Some(category.to_string()),
                confidence_score: 0.5,
                ..Default::default()
            })?;
        }

        let recent = storage.recent_chat_context(2)?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].category_matched.as_deref(), Some("water"));
        assert_eq!(recent[1].category_matched.as_deref(), Some("pests"));

        Ok(())
    }

    #[test]
    fn test_file_backed_reopen() -> StoreResult<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.db");

        {
            let storage = Storage::open(&path)?;
            storage.insert_knowledge(&knowledge("Cover crops", "", "c1"))?;
        }

        let storage = Storage::open(&path)?;
        assert_eq!(storage.count_active(Collection::Knowledge)?, 1);
        assert_eq!(storage.path(), Some(path.as_path()));

        Ok(())
    }
}
