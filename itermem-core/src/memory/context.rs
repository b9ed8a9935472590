//! Read-only aggregation: the context block injected into agent prompts and
//! store statistics.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::error::Result;
use crate::types::{Category, MemoryTier};

use super::{ListOptions, MemoryStore, SearchOptions};

/// Memory counts per tier and category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Total entries across all tiers.
    pub total: usize,
    pub working: usize,
    pub episodic: usize,
    pub semantic: usize,
    pub procedural: usize,
    /// Entries per category across all tiers.
    pub categories: BTreeMap<Category, usize>,
}

impl MemoryStats {
    /// Count for a single tier.
    pub fn tier(&self, tier: MemoryTier) -> usize {
        match tier {
            MemoryTier::Working => self.working,
            MemoryTier::Episodic => self.episodic,
            MemoryTier::Semantic => self.semantic,
            MemoryTier::Procedural => self.procedural,
        }
    }
}

/// One line of the context block.
struct ContextLine {
    content: String,
    category: Category,
    iteration: u64,
    score: f64,
}

impl MemoryStore {
    /// Build the memory block for an agent prompt.
    ///
    /// Episodic and semantic sections are searched when a non-empty query is
    /// given, otherwise they list the most recent records. Returns an empty
    /// string when every tier is empty.
    pub fn format_for_context(&self, query: Option<&str>) -> Result<String> {
        let limits = self.config().context;
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let mut sections = Vec::new();

        let working = self.recent(MemoryTier::Working, limits.working)?;
        if !working.is_empty() {
            let mut section = String::from("### Working Memory (this iteration)");
            for line in &working {
                let _ = write!(section, "\n  - {}", line.content);
            }
            sections.push(section);
        }

        let episodic = self.relevant(MemoryTier::Episodic, query, limits.episodic)?;
        if !episodic.is_empty() {
            let mut section = String::from("### Episodic Memory (what happened)");
            for line in &episodic {
                let _ = write!(
                    section,
                    "\n  - [iter {}|{}] ({:.0}%) {}",
                    line.iteration,
                    line.category,
                    line.score * 100.0,
                    line.content
                );
            }
            sections.push(section);
        }

        let semantic = self.relevant(MemoryTier::Semantic, query, limits.semantic)?;
        if !semantic.is_empty() {
            let mut section = String::from("### Semantic Memory (known facts)");
            for line in &semantic {
                let _ = write!(section, "\n  - [{}] {}", line.category, line.content);
            }
            sections.push(section);
        }

        let procedural = self.recent(MemoryTier::Procedural, limits.procedural)?;
        if !procedural.is_empty() {
            let mut section = String::from("### Procedural Memory (learned workflows)");
            for line in &procedural {
                let _ = write!(section, "\n  - {}", line.content);
            }
            sections.push(section);
        }

        if sections.is_empty() {
            return Ok(String::new());
        }

        Ok(format!("## Memory Bank\n\n{}", sections.join("\n\n")))
    }

    /// Count memories per tier and category.
    pub fn stats(&self) -> Result<MemoryStats> {
        let mut stats = MemoryStats::default();

        for tier in MemoryTier::ALL {
            let records = self.log().read_all(tier)?;
            let count = records.len();
            match tier {
                MemoryTier::Working => stats.working = count,
                MemoryTier::Episodic => stats.episodic = count,
                MemoryTier::Semantic => stats.semantic = count,
                MemoryTier::Procedural => stats.procedural = count,
            }
            stats.total += count;

            for record in records {
                *stats.categories.entry(record.category).or_insert(0) += 1;
            }
        }

        Ok(stats)
    }

    fn recent(&self, tier: MemoryTier, limit: usize) -> Result<Vec<ContextLine>> {
        Ok(self
            .get_all(&ListOptions::tier(tier, limit))?
            .into_iter()
            .map(|m| ContextLine {
                content: m.content,
                category: m.category,
                iteration: m.origin_iteration,
                score: m.score,
            })
            .collect())
    }

    fn relevant(
        &self,
        tier: MemoryTier,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ContextLine>> {
        let Some(query) = query else {
            return self.recent(tier, limit);
        };

        let options = SearchOptions {
            limit,
            ..SearchOptions::from_config(self.config()).in_tier(tier)
        };
        Ok(self
            .search(query, &options)?
            .into_iter()
            .map(|hit| ContextLine {
                content: hit.record.content,
                category: hit.record.category,
                iteration: hit.record.origin_iteration,
                score: hit.relevance,
            })
            .collect())
    }
}
