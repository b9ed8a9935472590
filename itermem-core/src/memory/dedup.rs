//! Content hashing, tokenization and duplicate detection.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::types::{Category, MemoryRecord};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("Invalid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N} _\-./]").expect("Invalid regex"));

/// Stable short hash: first 16 hex chars of SHA-256.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(16);
    digest
}

/// Case-folded, whitespace-collapsed, punctuation-stripped projection.
pub fn normalize_content(content: &str) -> String {
    let lower = content.to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lower, " ");
    DISALLOWED.replace_all(&collapsed, "").trim().to_string()
}

/// Hash of the normalized projection.
pub fn normalized_hash(content: &str) -> String {
    content_hash(&normalize_content(content))
}

/// Lower-cased words longer than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NON_WORD
        .split(&lower)
        .filter(|w| w.chars().count() > 2)
        .map(String::from)
        .collect()
}

/// Token set of a text.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard similarity of two token sets; 0 when either is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union.max(1) as f64
}

/// Fingerprint of candidate content, computed once per add.
#[derive(Debug, Clone)]
pub struct ContentFingerprint {
    pub hash: String,
    pub normalized_hash: String,
    pub tokens: HashSet<String>,
    /// Normalization removed every character (e.g. punctuation-only content).
    pub normalized_empty: bool,
}

impl ContentFingerprint {
    /// Fingerprint already-trimmed content.
    pub fn new(content: &str) -> Self {
        let normalized = normalize_content(content);
        Self {
            hash: content_hash(content),
            normalized_hash: content_hash(&normalized),
            tokens: token_set(content),
            normalized_empty: normalized.is_empty(),
        }
    }
}

/// Find an existing record that duplicates the candidate.
///
/// Exact and normalized hash matches count regardless of category; token
/// similarity only counts within the same category. An empty normalized
/// projection never matches on its hash.
pub fn find_duplicate<'a>(
    existing: &'a [MemoryRecord],
    candidate: &ContentFingerprint,
    category: Category,
    similarity_threshold: f64,
) -> Option<&'a MemoryRecord> {
    existing.iter().find(|m| {
        if m.content_hash == candidate.hash {
            return true;
        }
        if !candidate.normalized_empty && m.normalized_hash == candidate.normalized_hash {
            return true;
        }
        if m.category != category {
            return false;
        }
        jaccard(&candidate.tokens, &token_set(&m.content)) > similarity_threshold
    })
}
