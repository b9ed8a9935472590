//! Tiered long-term memory for iterative agent loops.
//!
//! Provides a four-tier memory architecture persisted as one JSONL log per tier:
//!
//! - **Working**: scratch context for the current iteration
//! - **Episodic**: per-iteration summaries (what happened, what failed)
//! - **Semantic**: extracted facts that survive across iterations
//! - **Procedural**: learned workflows
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MemoryStore                              │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────────┐  │
//! │  │ Working  │  │ Episodic │─▶│ Semantic │  │   Procedural   │  │
//! │  │          │  │ (decays) │  │ (decays) │  │    (decays)    │  │
//! │  └──────────┘  └──────────┘  └──────────┘  └────────────────┘  │
//! │        │             │  promote     │               │          │
//! │        └─────────────┴──────────────┴───────────────┘          │
//! │                            │                                    │
//! │          dedup ─▶ TierLog (append / read_all / overwrite)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use itermem_core::memory::{AddOptions, MemoryConfig, MemoryStore, SearchOptions};
//! use itermem_core::memory::StateFileIteration;
//!
//! let store = MemoryStore::open(".itermem/memory", StateFileIteration::new(".itermem/state.json"), MemoryConfig::default())?;
//!
//! store.add("auth tokens are cached in redis", AddOptions::semantic(Category::Decisions))?;
//! store.extract_from_output(&iteration_output, 4)?;
//!
//! let hits = store.search("auth tokens", &SearchOptions::default())?;
//! let block = store.format_for_context(Some("auth tokens"))?;
//! ```

mod consolidation;
mod context;
mod dedup;
mod scoring;
mod store;
mod tier_log;
mod traits;

pub use consolidation::*;
pub use context::*;
pub use dedup::*;
pub use scoring::*;
pub use store::*;
pub use tier_log::*;
pub use traits::*;

use serde::{Deserialize, Serialize};

use crate::types::{Category, MemoryTier, Metadata};

/// Configuration for the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum records kept per tier; exceeding it evicts the lowest-ranked.
    pub max_per_tier: usize,
    /// Token Jaccard similarity above which same-category content is a duplicate.
    pub similarity_threshold: f64,
    /// Default number of search results.
    pub search_limit: usize,
    /// Default minimum composite score for search results.
    pub search_threshold: f64,
    /// Default access count required for promotion.
    pub promote_min_access: u32,
    /// Per-tier limits for the context block.
    pub context: ContextLimits,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_per_tier: 500,
            similarity_threshold: 0.85,
            search_limit: 10,
            search_threshold: 0.1,
            promote_min_access: 2,
            context: ContextLimits::default(),
        }
    }
}

/// Number of records per tier included in the context block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextLimits {
    pub working: usize,
    pub episodic: usize,
    pub semantic: usize,
    pub procedural: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            working: 5,
            episodic: 15,
            semantic: 10,
            procedural: 5,
        }
    }
}

/// Options for adding memories.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Target tier (default: episodic).
    pub tier: MemoryTier,
    /// Category (default: progress).
    pub category: Category,
    /// Additional metadata.
    pub metadata: Metadata,
    /// Originating iteration; the current iteration when unset.
    pub iteration: Option<u64>,
    /// Reject content matching an existing record in the tier.
    pub deduplicate: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            tier: MemoryTier::Episodic,
            category: Category::Progress,
            metadata: Metadata::new(),
            iteration: None,
            deduplicate: true,
        }
    }
}

impl AddOptions {
    pub fn new(tier: MemoryTier, category: Category) -> Self {
        Self {
            tier,
            category,
            ..Self::default()
        }
    }

    pub fn episodic(category: Category) -> Self {
        Self::new(MemoryTier::Episodic, category)
    }

    pub fn semantic(category: Category) -> Self {
        Self::new(MemoryTier::Semantic, category)
    }

    pub fn at_iteration(mut self, iteration: u64) -> Self {
        self.iteration = Some(iteration);
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn allow_duplicates(mut self) -> Self {
        self.deduplicate = false;
        self
    }
}

/// One entry of a batch add.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub content: String,
    pub options: AddOptions,
}

impl From<&str> for NewMemory {
    fn from(content: &str) -> Self {
        Self {
            content: content.to_string(),
            options: AddOptions::default(),
        }
    }
}

impl From<String> for NewMemory {
    fn from(content: String) -> Self {
        Self {
            content,
            options: AddOptions::default(),
        }
    }
}

/// Options for searching memories.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Only search a specific tier.
    pub tier: Option<MemoryTier>,
    /// Only search a specific category.
    pub category: Option<Category>,
    /// Maximum number of results.
    pub limit: usize,
    /// Minimum composite score.
    pub threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        let config = MemoryConfig::default();
        Self {
            tier: None,
            category: None,
            limit: config.search_limit,
            threshold: config.search_threshold,
        }
    }
}

impl SearchOptions {
    /// Defaults taken from a store configuration.
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            limit: config.search_limit,
            threshold: config.search_threshold,
            ..Self::default()
        }
    }

    pub fn in_tier(mut self, tier: MemoryTier) -> Self {
        self.tier = Some(tier);
        self
    }
}

/// Options for listing memories.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub tier: Option<MemoryTier>,
    pub category: Option<Category>,
    pub limit: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            tier: None,
            category: None,
            limit: 100,
        }
    }
}

impl ListOptions {
    pub fn tier(tier: MemoryTier, limit: usize) -> Self {
        Self {
            tier: Some(tier),
            category: None,
            limit,
        }
    }
}
