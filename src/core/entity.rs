//! Entities - Knowledge base records
//!
//! Three soft-deletable item types (knowledge articles, FAQs, practices),
//! the category lookup, and the chat context log.
//!
//! # Lifecycle
//! - Created from a `New*` payload; the store assigns `id`, sets
//!   `is_active = true` and, for FAQs, `usage_count = 0`
//! - Mutated through `*Update` partials; only supplied fields change
//! - Retired by soft delete (`is_active = false`), never removed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Difficulty level of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            _ => anyhow::bail!("Unknown difficulty level: {}", s),
        }
    }
}

/// A category in the (self-referential) category tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl NewCategory {
    /// Create a category payload, deriving the slug from the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            description: String::new(),
            slug,
            parent_id: None,
        }
    }
}

/// Lowercase, ASCII-alphanumeric words joined by `-`
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// A knowledge article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    pub category_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A frequently asked question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub usage_count: u64,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An agricultural practice with ordered steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeItem {
    pub id: String,
    pub practice_name: String,
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefits: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<String>,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a knowledge article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewKnowledge {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub difficulty_level: DifficultyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

/// Payload for creating an FAQ (usage_count starts at zero)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    pub difficulty_level: DifficultyLevel,
}

/// Payload for creating a practice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPractice {
    pub practice_name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub benefits: Vec<String>,
    pub requirements: Vec<String>,
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub difficulty_level: DifficultyLevel,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

/// Partial update for a knowledge article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

/// Partial update for an FAQ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
}

/// Partial update for a practice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PracticeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// One chatbot query that consulted the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContextEntry {
    pub id: String,
    pub user_query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context_used: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_generated: String,
    #[serde(default)]
    pub category_matched: Option<String>,
    #[serde(default)]
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending to the chat context log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChatContext {
    pub user_query: String,
    pub context_used: Vec<String>,
    pub response_generated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_matched: Option<String>,
    pub confidence_score: f64,
}

/// Items that carry a category and tag/keyword lists
pub trait Tagged {
    fn category_id(&self) -> &str;
    fn tags(&self) -> &[String];
    fn keywords(&self) -> &[String];
}

macro_rules! impl_tagged {
    ($($ty:ty),*) => {
        $(
            impl Tagged for $ty {
                fn category_id(&self) -> &str {
                    &self.category_id
                }

                fn tags(&self) -> &[String] {
                    &self.tags
                }

                fn keywords(&self) -> &[String] {
                    &self.keywords
                }
            }
        )*
    };
}

impl_tagged!(KnowledgeItem, FaqItem, PracticeItem);

/// Hosted rows may carry `null` where we expect an empty list or string
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
