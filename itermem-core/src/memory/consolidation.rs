//! Score decay and tier promotion.
//!
//! Both run once per iteration boundary, driven by the orchestrator:
//!
//! ```text
//! ┌──────────────┐   decay    ┌──────────────┐   promote   ┌──────────────┐
//! │  iteration N │ ─────────▶ │ aged scores  │ ──────────▶ │ semantic tier│
//! └──────────────┘            └──────────────┘             └──────────────┘
//! ```

use crate::error::Result;
use crate::types::{MIN_SCORE, MemoryTier, round4};

use super::{AddOptions, MemoryStore, RECENCY_DECAY};

/// Smallest score change that counts as a mutation.
const SCORE_EPSILON: f64 = 0.001;

/// Score after decaying a record of the given age once.
pub fn decayed_score(score: f64, age: u64) -> f64 {
    (score - RECENCY_DECAY * age as f64 * 0.1).max(MIN_SCORE)
}

impl MemoryStore {
    /// Reduce the stored score of aged records in every decaying tier.
    ///
    /// A tier is rewritten only when at least one score changed. Returns the
    /// number of records mutated.
    pub fn apply_decay(&self) -> Result<usize> {
        let current = self.current_iteration();
        let mut count = 0;

        for tier in MemoryTier::ALL.into_iter().filter(|t| t.decays()) {
            let mut records = self.log().read_all(tier)?;
            let mut changed = false;

            for record in records.iter_mut() {
                let age = record.age(current);
                if age == 0 {
                    continue;
                }
                let new_score = decayed_score(record.score, age);
                if (new_score - record.score).abs() > SCORE_EPSILON {
                    record.score = round4(new_score).max(MIN_SCORE);
                    changed = true;
                    count += 1;
                }
            }

            if changed {
                self.log().overwrite(tier, &records)?;
            }
        }

        tracing::info!("Decay at iteration {} updated {} memories", current, count);
        Ok(count)
    }

    /// Copy frequently accessed episodic memories into the semantic tier.
    ///
    /// Goes through the normal add path, so content already present in the
    /// semantic tier is skipped by deduplication. Source records are left
    /// untouched. Returns the ids of every qualifying source record.
    pub fn promote(&self, min_access: u32) -> Result<Vec<String>> {
        let mut promoted = Vec::new();

        for record in self.log().read_all(MemoryTier::Episodic)? {
            if record.access_count < min_access {
                continue;
            }

            let options = AddOptions::semantic(record.category)
                .at_iteration(record.origin_iteration)
                .with_metadata("promoted_from", record.id.clone());
            let event = self.add(&record.content, options)?;
            tracing::debug!("Promotion of {} -> {:?}", record.id, event);

            promoted.push(record.id);
        }

        tracing::info!("Promoted {} episodic memories to semantic", promoted.len());
        Ok(promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedIteration, ListOptions, ManualIteration, MemoryConfig};
    use crate::types::{Category, MemoryEvent};
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn added_id(event: &MemoryEvent) -> String {
        event.id().expect("event should carry an id").to_string()
    }

    #[test]
    fn test_decay_reduces_old_scores() {
        let temp = tempdir().expect("Failed to create temp dir");
        let iteration = ManualIteration::new(1);
        let store =
            MemoryStore::open(temp.path(), iteration.clone(), MemoryConfig::default()).unwrap();

        let id = added_id(
            &store
                .add("old memory content", AddOptions::default().at_iteration(1))
                .unwrap(),
        );
        iteration.set(10);

        let count = store.apply_decay().unwrap();
        assert_eq!(count, 1);

        let score = store.get(&id).unwrap().unwrap().score;
        // 1.0 - 0.05 * 9 * 0.1
        assert!((score - 0.955).abs() < 1e-9);
        assert!(score >= MIN_SCORE);
    }

    #[test]
    fn test_decay_preserves_minimum() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(500), MemoryConfig::default()).unwrap();
        let id =
            added_id(&store.add("very old memory", AddOptions::default().at_iteration(1)).unwrap());

        store.apply_decay().unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().score, MIN_SCORE);

        // Already at the floor: nothing changes on the next pass
        assert_eq!(store.apply_decay().unwrap(), 0);
    }

    #[test]
    fn test_decay_leaves_unchanged_tier_file_alone() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(500), MemoryConfig::default()).unwrap();
        store.add("floor memory", AddOptions::default().at_iteration(1)).unwrap();
        assert_eq!(store.apply_decay().unwrap(), 1);

        // A rewrite would drop the unparseable line
        let path = store.log().path(MemoryTier::Episodic);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("not a record\n");
        std::fs::write(&path, &content).unwrap();

        assert_eq!(store.apply_decay().unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_decay_rewrites_changed_tier() {
        let temp = tempdir().expect("Failed to create temp dir");
        let iteration = ManualIteration::new(1);
        let store =
            MemoryStore::open(temp.path(), iteration.clone(), MemoryConfig::default()).unwrap();
        store.add("aging memory", AddOptions::default()).unwrap();

        let path = store.log().path(MemoryTier::Episodic);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("not a record\n");
        std::fs::write(&path, &content).unwrap();

        iteration.set(10);
        assert_eq!(store.apply_decay().unwrap(), 1);
        assert!(!std::fs::read_to_string(&path).unwrap().contains("not a record"));
    }

    #[test]
    fn test_decay_skips_working_and_current() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(5), MemoryConfig::default()).unwrap();

        store
            .add(
                "scratch",
                AddOptions::new(MemoryTier::Working, Category::Progress).at_iteration(1),
            )
            .unwrap();
        store.add("fresh", AddOptions::default()).unwrap();

        assert_eq!(store.apply_decay().unwrap(), 0);
    }

    #[test]
    fn test_decay_empty_store() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(3), MemoryConfig::default()).unwrap();
        assert_eq!(store.apply_decay().unwrap(), 0);
    }

    #[test]
    fn test_promote_by_access_count() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(2), MemoryConfig::default()).unwrap();

        let hot =
            added_id(&store.add("frequently accessed pattern", AddOptions::default()).unwrap());
        let cold = added_id(&store.add("rarely touched detail", AddOptions::default()).unwrap());
        for _ in 0..3 {
            store.record_access(&hot).unwrap();
        }
        store.record_access(&cold).unwrap();

        let promoted = store.promote(2).unwrap();
        assert_eq!(promoted, vec![hot.clone()]);

        let semantic = store.get_all(&ListOptions::tier(MemoryTier::Semantic, 10)).unwrap();
        assert_eq!(semantic.len(), 1);
        assert_eq!(semantic[0].content, "frequently accessed pattern");
        assert_eq!(semantic[0].promoted_from(), Some(hot.as_str()));
        assert_eq!(semantic[0].origin_iteration, 2);

        // Source untouched
        let source = store.get(&hot).unwrap().unwrap();
        assert_eq!(source.tier, MemoryTier::Episodic);
        assert_eq!(source.access_count, 3);
    }

    #[test]
    fn test_repeated_promotion_deduplicates() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(1), MemoryConfig::default()).unwrap();
        let id = added_id(&store.add("promote me once", AddOptions::default()).unwrap());
        store.record_access(&id).unwrap();

        assert_eq!(store.promote(1).unwrap().len(), 1);
        assert_eq!(store.promote(1).unwrap().len(), 1);
        assert_eq!(store.get_all(&ListOptions::tier(MemoryTier::Semantic, 10)).unwrap().len(), 1);
    }

    #[test]
    fn test_promote_empty_store() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(1), MemoryConfig::default()).unwrap();
        assert!(store.promote(2).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn decayed_score_stays_in_range(score in 0.1f64..=1.0, age in 0u64..10_000) {
            let decayed = decayed_score(score, age);
            prop_assert!(decayed >= MIN_SCORE);
            prop_assert!(decayed <= score);
        }
    }
}
