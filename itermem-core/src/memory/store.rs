//! JSONL-backed memory store.

use chrono::Utc;

use crate::error::Result;
use crate::types::{
    HistoryEntry, MAX_SCORE, MemoryEvent, MemoryRecord, MemoryTier, SkipReason, round4,
};

use super::{
    AddOptions, ContentFingerprint, IterationSource, ListOptions, MemoryConfig, NewMemory, Query,
    SearchHit, SearchOptions, TierLog, find_duplicate, score_record,
};

/// Multi-tier memory store.
///
/// Every call reads the tier logs fresh; there is no in-memory cache, so
/// external edits between calls are observed. One writer at a time.
pub struct MemoryStore {
    log: TierLog,
    iteration: Box<dyn IterationSource>,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Open a store rooted at `dir`.
    pub fn open(
        dir: impl Into<std::path::PathBuf>,
        iteration: impl IterationSource + 'static,
        config: MemoryConfig,
    ) -> Result<Self> {
        Ok(Self {
            log: TierLog::open(dir)?,
            iteration: Box::new(iteration),
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Underlying tier logs.
    pub fn log(&self) -> &TierLog {
        &self.log
    }

    /// Current iteration as reported by the orchestrator.
    pub fn current_iteration(&self) -> u64 {
        self.iteration.current_iteration()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // CRUD
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a memory.
    ///
    /// Empty content and duplicates are reported as skipped outcomes.
    pub fn add(&self, content: &str, options: AddOptions) -> Result<MemoryEvent> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(MemoryEvent::skipped(SkipReason::EmptyContent));
        }

        let fingerprint = ContentFingerprint::new(content);

        if options.deduplicate {
            let existing = self.log.read_all(options.tier)?;
            if let Some(dup) = find_duplicate(
                &existing,
                &fingerprint,
                options.category,
                self.config.similarity_threshold,
            ) {
                tracing::debug!("Skipping duplicate of {} in {}", dup.id, options.tier);
                return Ok(MemoryEvent::skipped(SkipReason::Duplicate {
                    existing_id: dup.id.clone(),
                }));
            }
        }

        let now = Utc::now();
        let record = MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            content_hash: fingerprint.hash,
            normalized_hash: fingerprint.normalized_hash,
            tier: options.tier,
            category: options.category,
            metadata: options.metadata,
            origin_iteration: options
                .iteration
                .unwrap_or_else(|| self.current_iteration()),
            created_at: now,
            updated_at: now,
            access_count: 0,
            score: MAX_SCORE,
        };

        self.log
            .append(record.tier, &record, self.config.max_per_tier)?;
        tracing::debug!("Added {} memory {} ({})", record.tier, record.id, record.category);

        Ok(MemoryEvent::Added {
            id: record.id,
            content: record.content,
            tier: record.tier,
            category: record.category,
        })
    }

    /// Add several memories, one outcome per entry.
    pub fn add_many<I, T>(&self, entries: I) -> Result<Vec<MemoryEvent>>
    where
        I: IntoIterator<Item = T>,
        T: Into<NewMemory>,
    {
        entries
            .into_iter()
            .map(|entry| {
                let entry = entry.into();
                self.add(&entry.content, entry.options)
            })
            .collect()
    }

    /// Get a memory by id from any tier.
    pub fn get(&self, id: &str) -> Result<Option<MemoryRecord>> {
        for tier in MemoryTier::ALL {
            if let Some(record) = self.log.read_all(tier)?.into_iter().find(|m| m.id == id) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// List memories, newest first.
    pub fn get_all(&self, options: &ListOptions) -> Result<Vec<MemoryRecord>> {
        let mut results = Vec::new();
        for tier in self.tiers(options.tier) {
            results.extend(
                self.log
                    .read_all(tier)?
                    .into_iter()
                    .filter(|m| options.category.is_none_or(|c| m.category == c)),
            );
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(options.limit);
        Ok(results)
    }

    /// Replace a memory's content.
    pub fn update(&self, id: &str, content: &str) -> Result<MemoryEvent> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(MemoryEvent::skipped(SkipReason::EmptyContent));
        }

        let fingerprint = ContentFingerprint::new(content);
        let mut old_content = None;
        self.modify(id, |record| {
            old_content = Some(std::mem::replace(&mut record.content, content.to_string()));
            record.content_hash = fingerprint.hash.clone();
            record.normalized_hash = fingerprint.normalized_hash.clone();
            record.updated_at = Utc::now();
        })?;

        Ok(match old_content {
            Some(old_content) => {
                tracing::debug!("Updated memory {}", id);
                MemoryEvent::Updated {
                    id: id.to_string(),
                    old_content,
                    content: content.to_string(),
                }
            }
            None => MemoryEvent::skipped(SkipReason::NotFound),
        })
    }

    /// Record that a consumer used a memory. Access counts drive promotion.
    pub fn record_access(&self, id: &str) -> Result<MemoryEvent> {
        let mut access_count = None;
        self.modify(id, |record| {
            record.access_count = record.access_count.saturating_add(1);
            access_count = Some(record.access_count);
        })?;

        Ok(match access_count {
            Some(access_count) => MemoryEvent::Accessed {
                id: id.to_string(),
                access_count,
            },
            None => MemoryEvent::skipped(SkipReason::NotFound),
        })
    }

    /// Delete a memory by id.
    pub fn delete(&self, id: &str) -> Result<MemoryEvent> {
        for tier in MemoryTier::ALL {
            let records = self.log.read_all(tier)?;
            let before = records.len();
            let kept: Vec<MemoryRecord> = records.into_iter().filter(|m| m.id != id).collect();
            if kept.len() < before {
                self.log.overwrite(tier, &kept)?;
                tracing::debug!("Deleted {} memory {}", tier, id);
                return Ok(MemoryEvent::Deleted { id: id.to_string() });
            }
        }
        Ok(MemoryEvent::skipped(SkipReason::NotFound))
    }

    /// History of a memory; empty when the id is unknown.
    pub fn history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .get(id)?
            .map(|m| HistoryEntry {
                memory: m.content,
                created_at: m.created_at,
                updated_at: m.updated_at,
            })
            .into_iter()
            .collect())
    }

    /// Clear one tier, or every tier when `tier` is `None`.
    pub fn reset(&self, tier: Option<MemoryTier>) -> Result<()> {
        for tier in self.tiers(tier) {
            if self.log.clear(tier)? {
                tracing::debug!("Cleared {} memory", tier);
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────

    /// Rank memories against a query.
    ///
    /// Results below the threshold are dropped; the rest are ordered by
    /// descending score, ties keeping storage order.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let query = Query::new(query);
        let current = self.current_iteration();

        let mut hits = Vec::new();
        for tier in self.tiers(options.tier) {
            for record in self.log.read_all(tier)? {
                if options.category.is_some_and(|c| record.category != c) {
                    continue;
                }
                let score = score_record(&record, &query, current);
                if score >= options.threshold {
                    hits.push(SearchHit {
                        record,
                        relevance: round4(score),
                    });
                }
            }
        }

        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(options.limit);
        Ok(hits)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn tiers(&self, tier: Option<MemoryTier>) -> Vec<MemoryTier> {
        match tier {
            Some(tier) => vec![tier],
            None => MemoryTier::ALL.to_vec(),
        }
    }

    /// Apply `f` to the record with `id` and rewrite its tier. Returns whether
    /// a record was found.
    fn modify<F>(&self, id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut MemoryRecord),
    {
        for tier in MemoryTier::ALL {
            let mut records = self.log.read_all(tier)?;
            if let Some(record) = records.iter_mut().find(|m| m.id == id) {
                f(record);
                self.log.overwrite(tier, &records)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
