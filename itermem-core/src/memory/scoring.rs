//! Relevance scoring for search.
//!
//! The composite score is
//!
//! ```text
//! ((keyword * KEYWORD_WEIGHT + exact) * 0.5 + recency * 0.3 + stored * 0.1
//!     + category_boost + access) * category_priority
//! ```
//!
//! clamped to at most 1.0. Ranking order depends on these exact weights.

use std::collections::HashSet;

use serde::Serialize;

use super::dedup::token_set;
use crate::types::MemoryRecord;

/// Per-iteration recency decay rate (λ). Also drives stored-score decay.
pub const RECENCY_DECAY: f64 = 0.05;
/// Bonus when the query names the record's category.
pub const CATEGORY_BOOST: f64 = 0.15;
/// Weight of keyword overlap.
pub const KEYWORD_WEIGHT: f64 = 1.0;
/// Bonus when the query appears verbatim in the content.
pub const EXACT_MATCH_BONUS: f64 = 0.3;
/// Access nudge per recorded access.
pub const ACCESS_STEP: f64 = 0.02;
/// Cap on the access nudge.
pub const ACCESS_CAP: f64 = 0.1;

/// A prepared search query.
#[derive(Debug, Clone)]
pub struct Query {
    lower: String,
    tokens: HashSet<String>,
}

impl Query {
    pub fn new(query: &str) -> Self {
        let lower = query.to_lowercase();
        let tokens = token_set(&lower);
        Self { lower, tokens }
    }

    pub fn as_str(&self) -> &str {
        &self.lower
    }
}

/// Individual signals behind a composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub keyword: f64,
    pub exact: f64,
    pub recency: f64,
    pub stored: f64,
    pub category_boost: f64,
    pub access: f64,
    pub priority: f64,
}

impl ScoreBreakdown {
    /// Compute every signal for a record.
    pub fn compute(record: &MemoryRecord, query: &Query, current_iteration: u64) -> Self {
        let content_lower = record.content.to_lowercase();
        let content_tokens = token_set(&content_lower);

        let keyword = if query.tokens.is_empty() || content_tokens.is_empty() {
            0.0
        } else {
            let overlap = query.tokens.intersection(&content_tokens).count();
            overlap as f64 / query.tokens.len().max(1) as f64
        };

        let exact = if content_lower.contains(&query.lower) {
            EXACT_MATCH_BONUS
        } else {
            0.0
        };

        let recency = recency(record.age(current_iteration));

        let category_boost = if query.lower.contains(&record.category.phrase()) {
            CATEGORY_BOOST
        } else {
            0.0
        };

        let access = (record.access_count as f64 * ACCESS_STEP).min(ACCESS_CAP);

        Self {
            keyword,
            exact,
            recency,
            stored: record.score,
            category_boost,
            access,
            priority: record.category.priority(),
        }
    }

    /// Combine the signals.
    pub fn composite(&self) -> f64 {
        let combined = (self.keyword * KEYWORD_WEIGHT + self.exact) * 0.5
            + self.recency * 0.3
            + self.stored * 0.1
            + self.category_boost
            + self.access;
        (combined * self.priority).min(1.0)
    }
}

/// exp(-λ · age).
pub fn recency(age: u64) -> f64 {
    (-RECENCY_DECAY * age as f64).exp()
}

/// Composite relevance of a record for a query.
pub fn score_record(record: &MemoryRecord, query: &Query, current_iteration: u64) -> f64 {
    ScoreBreakdown::compute(record, query, current_iteration).composite()
}

/// A search result: the record plus its composite score (rounded to four
/// decimals).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: MemoryRecord,
    pub relevance: f64,
}
