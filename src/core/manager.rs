//! Management view - State behind the admin screen
//!
//! Three tabs over the item collections plus a search box and a category
//! filter. Any change to tab or filters re-runs the combined search and
//! replaces all three lists, whichever tab is showing.

use super::collection::{Collection, CATEGORIES_TABLE};
use super::entity::Category;
use super::error::QueryFailure;
use super::service::{DeleteOutcome, KnowledgeService, SearchResults};

/// Text shown for a category id with no matching category
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Cell text for a missing optional value
pub const EMPTY_CELL: &str = "-";

/// Prompt shown before a delete
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this item?";

/// Admin screen tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Knowledge,
    Faqs,
    Practices,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Knowledge, Tab::Faqs, Tab::Practices];

    pub fn collection(self) -> Collection {
        match self {
            Tab::Knowledge => Collection::Knowledge,
            Tab::Faqs => Collection::Faqs,
            Tab::Practices => Collection::Practices,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Knowledge => "Knowledge Base",
            Tab::Faqs => "FAQs",
            Tab::Practices => "Practices",
        }
    }

    /// Column headers for this tab's table
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Tab::Knowledge => &["ID", "Title", "Summary", "Category", "Region", "Crop"],
            Tab::Faqs => &["ID", "Question", "Category", "Region", "Usage"],
            Tab::Practices => &["ID", "Practice", "Category", "Region", "Crop"],
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Result of a delete from the admin screen
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteResult {
    /// User declined; nothing happened
    Cancelled,
    /// Delete went through and the lists were reloaded
    Deleted(DeleteOutcome),
    /// Delete failed; show the reason as a blocking alert
    Failed(String),
}

/// Tab, filters and the lists currently on screen
pub struct ManagementView<'a> {
    service: &'a KnowledgeService,
    tab: Tab,
    search_query: String,
    selected_category: Option<String>,
    categories: Vec<Category>,
    results: SearchResults,
    failures: Vec<QueryFailure>,
}

impl<'a> ManagementView<'a> {
    /// Empty view; call `load` to populate
    pub fn new(service: &'a KnowledgeService) -> Self {
        Self {
            service,
            tab: Tab::default(),
            search_query: String::new(),
            selected_category: None,
            categories: Vec::new(),
            results: SearchResults::default(),
            failures: Vec::new(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Parts of the last load that failed
    pub fn failures(&self) -> &[QueryFailure] {
        &self.failures
    }

    /// Refresh categories and all three lists
    ///
    /// Categories keep their previous value if the refresh fails.
    pub async fn load(&mut self) {
        let mut failures = Vec::new();

        match self.service.list_categories().await {
            Ok(categories) => self.categories = categories,
            Err(e) => failures.push(QueryFailure::new(CATEGORIES_TABLE, &e)),
        }

        self.results = self
            .service
            .search(&self.search_query, self.selected_category.as_deref())
            .await;
        failures.extend(self.results.failures.iter().cloned());

        self.failures = failures;
    }

    pub async fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.load().await;
    }

    pub async fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.load().await;
    }

    /// `None` or an empty id means all categories
    pub async fn set_category(&mut self, category_id: Option<String>) {
        self.selected_category = category_id.filter(|c| !c.is_empty());
        self.load().await;
    }

    /// Confirm, soft delete from the active tab, then reload
    pub async fn delete(&mut self, id: &str, confirm: &mut dyn Confirm) -> DeleteResult {
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteResult::Cancelled;
        }

        match self.service.soft_delete(self.tab.collection(), id).await {
            Ok(outcome) => {
                self.load().await;
                DeleteResult::Deleted(outcome)
            }
            Err(e) => DeleteResult::Failed(e.to_string()),
        }
    }

    /// Category name for an id, or "Unknown"
    pub fn category_name(&self, category_id: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Ids of the rows on the active tab, in display order
    pub fn row_ids(&self) -> Vec<&str> {
        match self.tab {
            Tab::Knowledge => self.results.knowledge.iter().map(|i| i.id.as_str()).collect(),
            Tab::Faqs => self.results.faqs.iter().map(|i| i.id.as_str()).collect(),
            Tab::Practices => self.results.practices.iter().map(|i| i.id.as_str()).collect(),
        }
    }

    /// Table cells for the active tab, matching `Tab::headers`
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self.tab {
            Tab::Knowledge => self
                .results
                .knowledge
                .iter()
                .map(|i| {
                    vec![
                        i.id.clone(),
                        i.title.clone(),
                        i.summary.clone(),
                        self.category_name(&i.category_id).to_string(),
                        cell(&i.region),
                        cell(&i.crop_type),
                    ]
                })
                .collect(),
            Tab::Faqs => self
                .results
                .faqs
                .iter()
                .map(|i| {
                    vec![
                        i.id.clone(),
                        i.question.clone(),
                        self.category_name(&i.category_id).to_string(),
                        cell(&i.region),
                        i.usage_count.to_string(),
                    ]
                })
                .collect(),
            Tab::Practices => self
                .results
                .practices
                .iter()
                .map(|i| {
                    vec![
                        i.id.clone(),
                        i.practice_name.clone(),
                        self.category_name(&i.category_id).to_string(),
                        cell(&i.region),
                        cell(&i.crop_type),
                    ]
                })
                .collect(),
        }
    }
}

fn cell(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY_CELL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::entity::{NewCategory, NewFaq, NewKnowledge, NewPractice};
    use crate::core::error::StoreResult;
    use crate::core::service::ServiceSettings;
    use crate::core::store::LocalStore;

    struct Answer(bool);

    impl Confirm for Answer {
        fn confirm(&mut self, prompt: &str) -> bool {
            assert_eq!(prompt, DELETE_PROMPT);
            self.0
        }
    }

    async fn seeded() -> StoreResult<KnowledgeService> {
        let store = LocalStore::in_memory()?;
        let svc = KnowledgeService::new(Arc::new(store), ServiceSettings::default());

        let soil = svc.add_category(NewCategory::new("Soil")).await?;
        svc.add_knowledge(NewKnowledge {
            title: "Soil pH".to_string(),
            content: "Lime raises pH".to_string(),
            summary: "Testing and correcting pH".to_string(),
            category_id: soil.id.clone(),
            region: Some("Kenya".to_string()),
            ..Default::default()
        })
        .await?;
        svc.add_knowledge(NewKnowledge {
            title: "Seed saving".to_string(),
            content: "Dry seeds".to_string(),
            category_id: "gone".to_string(),
            ..Default::default()
        })
        .await?;
        svc.add_faq(NewFaq {
            question: "Why is my soil acidic?".to_string(),
            answer: "Rainfall leaches bases".to_string(),
            category_id: soil.id.clone(),
            ..Default::default()
        })
        .await?;
        svc.add_practice(NewPractice {
            practice_name: "Liming".to_string(),
            description: "Apply agricultural lime".to_string(),
            category_id: soil.id,
            crop_type: Some("maize".to_string()),
            ..Default::default()
        })
        .await?;

        Ok(svc)
    }

    #[tokio::test]
    async fn test_load_fills_every_tab() -> StoreResult<()> {
        let svc = seeded().await?;
        let mut view = ManagementView::new(&svc);
        view.load().await;

        assert!(view.failures().is_empty());
        assert_eq!(view.categories().len(), 1);
        assert_eq!(view.results().knowledge.len(), 2);
        assert_eq!(view.results().faqs.len(), 1);
        assert_eq!(view.results().practices.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_filter_change_reloads() -> StoreResult<()> {
        let svc = seeded().await?;
        let mut view = ManagementView::new(&svc);
        view.load().await;

        view.set_search_query("pH").await;
        assert_eq!(view.search_query(), "pH");
        assert_eq!(view.results().knowledge.len(), 1);
        assert!(view.results().faqs.is_empty());

        let soil_id = view.categories()[0].id.clone();
        view.set_search_query("").await;
        view.set_category(Some(soil_id)).await;
        assert_eq!(view.results().knowledge.len(), 1);
        assert_eq!(view.results().faqs.len(), 1);

        view.set_category(Some(String::new())).await;
        assert_eq!(view.selected_category(), None);
        assert_eq!(view.results().knowledge.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_rows_render_names_and_placeholders() -> StoreResult<()> {
        let svc = seeded().await?;
        let mut view = ManagementView::new(&svc);
        view.set_search_query("Seed").await;

        let rows = view.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), Tab::Knowledge.headers().len());
        assert_eq!(rows[0][3], UNKNOWN_CATEGORY);
        assert_eq!(rows[0][4], EMPTY_CELL);

        view.set_search_query("").await;
        view.set_tab(Tab::Practices).await;
        let rows = view.rows();
        assert_eq!(rows[0][1], "Liming");
        assert_eq!(rows[0][2], "Soil");
        assert_eq!(rows[0][4], "maize");

        view.set_tab(Tab::Faqs).await;
        assert_eq!(view.rows()[0][4], "0");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cancel_and_confirm() -> StoreResult<()> {
        let svc = seeded().await?;
        let mut view = ManagementView::new(&svc);
        view.set_tab(Tab::Faqs).await;
        let id = view.row_ids()[0].to_string();

        let result = view.delete(&id, &mut Answer(false)).await;
        assert_eq!(result, DeleteResult::Cancelled);
        assert_eq!(view.results().faqs.len(), 1);

        let result = view.delete(&id, &mut Answer(true)).await;
        assert_eq!(result, DeleteResult::Deleted(DeleteOutcome::Deactivated));
        assert!(view.results().faqs.is_empty());

        let result = view.delete("abc", &mut Answer(true)).await;
        assert_eq!(result, DeleteResult::Deleted(DeleteOutcome::NoMatch));

        Ok(())
    }
}
