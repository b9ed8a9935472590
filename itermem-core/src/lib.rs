//! itermem-core - Tiered memory for iterative agent loops
//!
//! This crate provides the memory store shared by the itermem CLI and any
//! orchestrator that embeds it:
//!
//! - **memory**: JSONL-backed tiers, deduplication, search, decay and promotion
//! - **extraction**: rule-based extraction of memories from agent output
//! - **types**: records, tiers, categories and mutation outcomes

pub mod error;
pub mod extraction;
pub mod memory;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use extraction::ExtractedMemory;
pub use memory::{
    AddOptions, FixedIteration, IterationSource, ListOptions, ManualIteration, MemoryConfig,
    MemoryStats, MemoryStore, SearchHit, SearchOptions, StateFileIteration,
};
pub use types::{Category, HistoryEntry, MemoryEvent, MemoryRecord, MemoryTier, SkipReason};
