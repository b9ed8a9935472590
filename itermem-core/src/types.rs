//! Shared types for the itermem memory store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest score a record can decay to.
pub const MIN_SCORE: f64 = 0.1;

/// Score assigned to freshly created records.
pub const MAX_SCORE: f64 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Tiers and categories
// ─────────────────────────────────────────────────────────────────────────────

/// Memory tier. Each tier is persisted in its own log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Scratch context for the current iteration.
    Working,
    /// Per-iteration summaries: what happened, what changed, what failed.
    Episodic,
    /// Extracted facts that survive across iterations.
    Semantic,
    /// Learned workflows.
    Procedural,
}

impl MemoryTier {
    /// All tiers in storage order.
    pub const ALL: [MemoryTier; 4] = [
        MemoryTier::Working,
        MemoryTier::Episodic,
        MemoryTier::Semantic,
        MemoryTier::Procedural,
    ];

    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryTier::Working => "working",
            MemoryTier::Episodic => "episodic",
            MemoryTier::Semantic => "semantic",
            MemoryTier::Procedural => "procedural",
        }
    }

    /// Tiers whose scores decay between iterations.
    pub fn decays(&self) -> bool {
        !matches!(self, MemoryTier::Working)
    }
}

impl std::fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryTier {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "working" => Ok(MemoryTier::Working),
            "episodic" => Ok(MemoryTier::Episodic),
            "semantic" => Ok(MemoryTier::Semantic),
            "procedural" => Ok(MemoryTier::Procedural),
            _ => Err(format!("Invalid memory tier: {}", s)),
        }
    }
}

/// Memory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Which files were modified and how.
    FileChanges,
    /// Errors encountered and resolutions.
    Errors,
    /// Choices made during the task.
    Decisions,
    /// Outstanding blockers or unknowns.
    Blockers,
    /// Task completion milestones.
    Progress,
    /// Repeated code patterns observed.
    Patterns,
    /// Import/package dependencies touched.
    Dependencies,
    /// Test runs and outcomes.
    TestResults,
    /// Environment setup, paths, config.
    Environment,
    /// Scope of the current task.
    TaskContext,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::FileChanges,
        Category::Errors,
        Category::Decisions,
        Category::Blockers,
        Category::Progress,
        Category::Patterns,
        Category::Dependencies,
        Category::TestResults,
        Category::Environment,
        Category::TaskContext,
    ];

    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FileChanges => "file_changes",
            Category::Errors => "errors",
            Category::Decisions => "decisions",
            Category::Blockers => "blockers",
            Category::Progress => "progress",
            Category::Patterns => "patterns",
            Category::Dependencies => "dependencies",
            Category::TestResults => "test_results",
            Category::Environment => "environment",
            Category::TaskContext => "task_context",
        }
    }

    /// Multiplier applied to the composite search score.
    pub fn priority(&self) -> f64 {
        match self {
            Category::Errors => 1.15,
            Category::Blockers => 1.1,
            Category::TestResults | Category::FileChanges | Category::Decisions => 1.05,
            Category::Dependencies | Category::Progress => 1.0,
            Category::Patterns | Category::Environment => 0.95,
            Category::TaskContext => 0.9,
        }
    }

    /// Phrase form used to detect the category being named in a query
    /// (`test_results` -> `test results`).
    pub fn phrase(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid memory category: {}", s))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// Open metadata map attached to a record.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single stored memory.
///
/// Field names on disk follow the established JSONL layout, so a few fields
/// are renamed for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    #[serde(rename = "hash")]
    pub content_hash: String,
    #[serde(default)]
    pub normalized_hash: String,
    #[serde(rename = "memory_type")]
    pub tier: MemoryTier,
    pub category: Category,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(rename = "iteration")]
    pub origin_iteration: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub access_count: u32,
    #[serde(default = "default_score")]
    pub score: f64,
}

fn default_score() -> f64 {
    MAX_SCORE
}

/// Clamp a stored score into the valid range.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Round to four decimal places, the precision scores are persisted and
/// reported at.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl MemoryRecord {
    /// Iterations elapsed since this record was created, never negative.
    pub fn age(&self, current_iteration: u64) -> u64 {
        current_iteration.saturating_sub(self.origin_iteration)
    }

    /// Id of the episodic record this one was promoted from, if any.
    pub fn promoted_from(&self) -> Option<&str> {
        self.metadata.get("promoted_from").and_then(|v| v.as_str())
    }
}

/// Historical view of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub memory: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// Why an operation did not change the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// Content was empty or whitespace-only.
    EmptyContent,
    /// Content matches an existing record in the same tier.
    Duplicate { existing_id: String },
    /// No record with the requested id.
    NotFound,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyContent => write!(f, "empty content"),
            SkipReason::Duplicate { existing_id } => write!(f, "duplicate of {}", existing_id),
            SkipReason::NotFound => write!(f, "not found"),
        }
    }
}

/// Outcome of a mutating store operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum MemoryEvent {
    Added {
        id: String,
        content: String,
        tier: MemoryTier,
        category: Category,
    },
    Updated {
        id: String,
        old_content: String,
        content: String,
    },
    Deleted {
        id: String,
    },
    Accessed {
        id: String,
        access_count: u32,
    },
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl MemoryEvent {
    pub(crate) fn skipped(reason: SkipReason) -> Self {
        MemoryEvent::Skipped { reason }
    }

    /// Id of the affected record. For duplicates this is the existing record.
    pub fn id(&self) -> Option<&str> {
        match self {
            MemoryEvent::Added { id, .. }
            | MemoryEvent::Updated { id, .. }
            | MemoryEvent::Deleted { id }
            | MemoryEvent::Accessed { id, .. } => Some(id),
            MemoryEvent::Skipped {
                reason: SkipReason::Duplicate { existing_id },
            } => Some(existing_id),
            MemoryEvent::Skipped { .. } => None,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, MemoryEvent::Added { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            MemoryEvent::Skipped {
                reason: SkipReason::Duplicate { .. }
            }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MemoryEvent::Skipped {
                reason: SkipReason::NotFound
            }
        )
    }
}
