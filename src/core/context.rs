//! Context - Keyword matching for chatbot prompts
//!
//! Pulls a few relevant items out of the knowledge base for a free-text
//! question and renders them as a prompt block.
//!
//! # Scoring
//! - Keywords: lowercase words longer than two chars, stop words removed,
//!   first 10 kept
//! - Score: query keywords that overlap (substring either way) any of the
//!   item's tags or keywords, divided by the larger of the two list sizes

use std::collections::HashSet;

use serde::Serialize;

use super::entity::{FaqItem, KnowledgeItem, PracticeItem, Tagged};
use super::error::QueryFailure;

/// Maximum keywords taken from one query
pub const MAX_KEYWORDS: usize = 10;

/// Characters of article content shown in a prompt
const CONTENT_PREVIEW_CHARS: usize = 200;

/// Steps or benefits shown per practice in a prompt
const LIST_PREVIEW_ITEMS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "must", "shall", "i", "you", "he",
    "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its",
    "our", "their", "this", "that", "these", "those", "what", "which", "who", "whom", "whose",
    "where", "when", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
    "just", "now",
];

/// Extract search keywords from a user question
pub fn extract_keywords(query: &str) -> Vec<String> {
    let normalized: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Overlap between query keywords and an item's tags/keywords, in [0, 1]
pub fn similarity(query_keywords: &[String], item_keywords: &[String]) -> f64 {
    if item_keywords.is_empty() {
        return 0.0;
    }

    let item_lower: Vec<String> = item_keywords.iter().map(|k| k.to_lowercase()).collect();
    let matched = query_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|keyword| {
            item_lower
                .iter()
                .any(|item| item.contains(keyword.as_str()) || keyword.contains(item.as_str()))
        })
        .count();

    matched as f64 / query_keywords.len().max(item_keywords.len()) as f64
}

/// An item with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<T> {
    #[serde(flatten)]
    pub item: T,
    pub score: f64,
}

/// Score candidates, keep those above `min_score`, best `top_k` first
pub fn rank<T: Tagged>(
    keywords: &[String],
    candidates: Vec<T>,
    min_score: f64,
    top_k: usize,
) -> Vec<Scored<T>> {
    let mut scored: Vec<Scored<T>> = candidates
        .into_iter()
        .map(|item| {
            let mut labels = item.tags().to_vec();
            labels.extend_from_slice(item.keywords());
            let score = similarity(keywords, &labels);
            Scored { item, score }
        })
        .filter(|s| s.score > min_score)
        .collect();

    // Stable sort keeps fetch order among equal scores
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}

/// Relevant items for one question
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextResult {
    pub knowledge: Vec<Scored<KnowledgeItem>>,
    pub faqs: Vec<Scored<FaqItem>>,
    pub practices: Vec<Scored<PracticeItem>>,
    /// Category ids of the kept items, first-seen order
    pub matched_categories: Vec<String>,
    /// Mean score of the kept items (0 when none)
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<QueryFailure>,
}

impl ContextResult {
    pub fn new(
        knowledge: Vec<Scored<KnowledgeItem>>,
        faqs: Vec<Scored<FaqItem>>,
        practices: Vec<Scored<PracticeItem>>,
        failures: Vec<QueryFailure>,
    ) -> Self {
        let mut seen = HashSet::new();
        let matched_categories = knowledge
            .iter()
            .map(|s| s.item.category_id())
            .chain(faqs.iter().map(|s| s.item.category_id()))
            .chain(practices.iter().map(|s| s.item.category_id()))
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        let scores: Vec<f64> = knowledge
            .iter()
            .map(|s| s.score)
            .chain(faqs.iter().map(|s| s.score))
            .chain(practices.iter().map(|s| s.score))
            .collect();
        let confidence_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            knowledge,
            faqs,
            practices,
            matched_categories,
            confidence_score,
            failures,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.knowledge.is_empty() && self.faqs.is_empty() && self.practices.is_empty()
    }

    /// Ids of every item used, for the chat context log
    pub fn item_ids(&self) -> Vec<String> {
        self.knowledge
            .iter()
            .map(|s| s.item.id.clone())
            .chain(self.faqs.iter().map(|s| s.item.id.clone()))
            .chain(self.practices.iter().map(|s| s.item.id.clone()))
            .collect()
    }
}

/// Render context as a prompt block; empty when nothing matched
pub fn format_for_prompt(context: &ContextResult) -> String {
    let mut out = String::new();

    if !context.knowledge.is_empty() {
        out.push_str("\n\nRELEVANT AGRICULTURAL KNOWLEDGE:\n");
        for (i, Scored { item, .. }) in context.knowledge.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, item.title));
            out.push_str(&format!("   Summary: {}\n", item.summary));
            let preview: String = item.content.chars().take(CONTENT_PREVIEW_CHARS).collect();
            out.push_str(&format!("   Content: {}...\n", preview));
            push_location(&mut out, &item.region, &item.crop_type);
            out.push('\n');
        }
    }

    if !context.faqs.is_empty() {
        out.push_str("\n\nRELEVANT FREQUENTLY ASKED QUESTIONS:\n");
        for (i, Scored { item, .. }) in context.faqs.iter().enumerate() {
            out.push_str(&format!("{}. Q: {}\n", i + 1, item.question));
            out.push_str(&format!("   A: {}\n", item.answer));
            push_location(&mut out, &item.region, &item.crop_type);
            out.push('\n');
        }
    }

    if !context.practices.is_empty() {
        out.push_str("\n\nRELEVANT AGRICULTURAL PRACTICES:\n");
        for (i, Scored { item, .. }) in context.practices.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, item.practice_name));
            out.push_str(&format!("   Description: {}\n", item.description));
            if !item.steps.is_empty() {
                out.push_str(&format!("   Steps: {}\n", preview_list(&item.steps)));
            }
            if !item.benefits.is_empty() {
                out.push_str(&format!("   Benefits: {}\n", preview_list(&item.benefits)));
            }
            push_location(&mut out, &item.region, &item.crop_type);
            out.push('\n');
        }
    }

    out
}

fn push_location(out: &mut String, region: &Option<String>, crop_type: &Option<String>) {
    if let Some(region) = region.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!("   Region: {}\n", region));
    }
    if let Some(crop) = crop_type.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("   Crop: {}\n", crop));
    }
}

fn preview_list(items: &[String]) -> String {
    items
        .iter()
        .take(LIST_PREVIEW_ITEMS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::DifficultyLevel;

    fn faq(id: &str, category: &str, keywords: &[&str]) -> FaqItem {
        FaqItem {
            id: id.to_string(),
            question: format!("Question {}", id),
            answer: format!("Answer {}", id),
            category_id: category.to_string(),
            tags: Vec::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            region: None,
            crop_type: None,
            difficulty_level: DifficultyLevel::Beginner,
            usage_count: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_short_words() {
        let keywords = extract_keywords("How do I test the pH of my soil?");
        assert_eq!(keywords, vec!["test", "soil"]);
    }

    #[test]
    fn test_extract_keywords_strips_punctuation_and_caps_at_ten() {
        let keywords = extract_keywords("maize, wheat; barley! sorghum millet cassava yams taro okra kale beans peas");
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "maize");
        assert_eq!(keywords[2], "barley");
        assert!(!keywords.contains(&"peas".to_string()));
    }

    #[test]
    fn test_similarity() {
        let query = words(&["tomato", "blight"]);

        assert_eq!(similarity(&query, &[]), 0.0);
        // "tomatoes" contains "tomato"; one of two matches
        assert_eq!(similarity(&query, &words(&["Tomatoes", "irrigation"])), 0.5);
        // Denominator is the larger list
        assert_eq!(
            similarity(&query, &words(&["tomato", "blight", "fungus", "spray"])),
            0.5
        );
        assert_eq!(similarity(&query, &words(&["blight", "tomato"])), 1.0);
    }

    #[test]
    fn test_rank_filters_sorts_and_truncates() {
        let keywords = words(&["tomato", "blight"]);
        let candidates = vec![
            faq("weak", "c1", &["tomato", "soil", "water", "sun", "wind", "rain"]),
            faq("none", "c1", &["maize"]),
            faq("best", "c2", &["tomato", "blight"]),
            faq("mid", "c3", &["blight", "fungus"]),
            faq("also-mid", "c4", &["tomato", "pruning"]),
        ];

        let ranked = rank(&keywords, candidates, 0.1, 3);
        let ids: Vec<&str> = ranked.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["best", "mid", "also-mid"]);
        assert_eq!(ranked[0].score, 1.0);
    }

    #[test]
    fn test_context_result_categories_and_confidence() {
        let faqs = vec![
            Scored { item: faq("a", "soil", &[]), score: 1.0 },
            Scored { item: faq("b", "pests", &[]), score: 0.5 },
            Scored { item: faq("c", "soil", &[]), score: 0.3 },
        ];
        let result = ContextResult::new(Vec::new(), faqs, Vec::new(), Vec::new());

        assert_eq!(result.matched_categories, vec!["soil", "pests"]);
        assert!((result.confidence_score - 0.6).abs() < 1e-9);
        assert_eq!(result.item_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_context_formats_to_empty_string() {
        let result = ContextResult::default();
        assert!(result.is_empty());
        assert_eq!(result.confidence_score, 0.0);
        assert_eq!(format_for_prompt(&result), "");
    }

    #[test]
    fn test_format_for_prompt_layout() {
        let practice = PracticeItem {
            id: "p1".to_string(),
            practice_name: "Crop rotation".to_string(),
            description: "Alternate crop families".to_string(),
            steps: words(&["Plan", "Plant legumes", "Plant cereals", "Repeat"]),
            benefits: Vec::new(),
            requirements: Vec::new(),
            category_id: "soil".to_string(),
            crop_type: None,
            season: None,
            region: Some("Punjab".to_string()),
            difficulty_level: DifficultyLevel::Intermediate,
            tags: Vec::new(),
            keywords: Vec::new(),
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        let result = ContextResult::new(
            Vec::new(),
            vec![Scored { item: faq("f1", "soil", &[]), score: 0.5 }],
            vec![Scored { item: practice, score: 0.5 }],
            Vec::new(),
        );

        let prompt = format_for_prompt(&result);
        assert!(prompt.starts_with("\n\nRELEVANT FREQUENTLY ASKED QUESTIONS:\n1. Q: Question f1\n   A: Answer f1\n"));
        assert!(prompt.contains("RELEVANT AGRICULTURAL PRACTICES:\n1. Crop rotation\n"));
        assert!(prompt.contains("   Steps: Plan, Plant legumes, Plant cereals\n"));
        assert!(!prompt.contains("Benefits"));
        assert!(prompt.contains("   Region: Punjab\n"));
        assert!(!prompt.contains("KNOWLEDGE"));
    }

    #[test]
    fn test_content_preview_is_truncated() {
        let item = KnowledgeItem {
            id: "k1".to_string(),
            title: "Long".to_string(),
            content: "x".repeat(500),
            summary: "s".to_string(),
            category_id: "c".to_string(),
            tags: Vec::new(),
            keywords: Vec::new(),
            difficulty_level: DifficultyLevel::Beginner,
            region: None,
            crop_type: None,
            season: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        let result = ContextResult::new(
            vec![Scored { item, score: 1.0 }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let prompt = format_for_prompt(&result);
        let expected = format!("   Content: {}...\n", "x".repeat(200));
        assert!(prompt.contains(&expected));
    }
}
