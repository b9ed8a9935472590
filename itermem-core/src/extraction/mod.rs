//! Heuristic memory extraction from agent output.
//!
//! Turns raw iteration output into episodic records (files touched, errors,
//! test summaries, completion markers, version-control operations) and free
//! text into semantic facts. Extraction is pattern based; every candidate is
//! written through [`MemoryStore::add`] so deduplication applies.

mod rules;

pub use rules::*;

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::Result;
use crate::memory::{AddOptions, MemoryStore};
use crate::types::{Category, MemoryEvent, MemoryTier};

/// A memory candidate produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedMemory {
    pub content: String,
    pub tier: MemoryTier,
    pub category: Category,
    /// Name of the rule that produced it.
    pub rule: &'static str,
}

/// Episodic candidates found in one iteration's output, in rule order.
pub fn episodic_candidates(output: &str, iteration: u64) -> Vec<ExtractedMemory> {
    let mut found = Vec::new();
    if output.trim().is_empty() {
        return found;
    }

    for rule in EPISODIC_RULES.iter() {
        let candidate = |content: String| ExtractedMemory {
            content,
            tier: MemoryTier::Episodic,
            category: rule.category,
            rule: rule.name,
        };
        let captures = move || {
            rule.patterns.iter().flat_map(move |pattern| {
                pattern
                    .captures_iter(output)
                    .filter_map(move |c| c.get(rule.group))
                    .map(move |m| excerpt(m.as_str(), rule.max_chars))
            })
        };

        match rule.collect {
            Collect::Aggregate { exclude_prefix } => {
                let items: BTreeSet<&str> = captures()
                    .filter(|c| !c.starts_with(exclude_prefix))
                    .collect();
                if !items.is_empty() {
                    let joined = items.into_iter().collect::<Vec<_>>().join(", ");
                    found.push(candidate((rule.render)(iteration, &joined)));
                }
            }
            Collect::EachUnique { cap } => {
                let mut seen = HashSet::new();
                for item in captures().filter(|c| !c.is_empty()) {
                    if seen.len() == cap {
                        break;
                    }
                    if seen.insert(item) {
                        found.push(candidate((rule.render)(iteration, item)));
                    }
                }
            }
            Collect::FirstMatch => {
                let first = rule
                    .patterns
                    .iter()
                    .find_map(|pattern| pattern.captures(output))
                    .and_then(|c| c.get(rule.group))
                    .map(|m| excerpt(m.as_str(), rule.max_chars));
                if let Some(summary) = first {
                    found.push(candidate((rule.render)(iteration, summary)));
                }
            }
            Collect::Marker(marker) => {
                if output.contains(marker) {
                    found.push(candidate((rule.render)(iteration, marker)));
                }
            }
            Collect::EachMatch => {
                for item in captures().filter(|c| !c.is_empty()) {
                    found.push(candidate((rule.render)(iteration, item)));
                }
            }
        }
    }

    found
}

/// Semantic fact candidates found in free text, in rule order.
pub fn fact_candidates(text: &str) -> Vec<ExtractedMemory> {
    let mut found = Vec::new();
    for rule in FACT_RULES.iter() {
        for captures in rule.pattern.captures_iter(text) {
            let Some(fact) = captures.get(1).map(|m| excerpt(m.as_str(), FACT_EXCERPT)) else {
                continue;
            };
            if fact.is_empty() {
                continue;
            }
            found.push(ExtractedMemory {
                content: fact.to_string(),
                tier: MemoryTier::Semantic,
                category: rule.category,
                rule: rule.name,
            });
        }
    }
    found
}

impl MemoryStore {
    /// Extract episodic memories from one iteration's output.
    ///
    /// Returns one outcome per candidate. Candidates that duplicate existing
    /// records come back as skipped.
    pub fn extract_from_output(&self, output: &str, iteration: u64) -> Result<Vec<MemoryEvent>> {
        let candidates = episodic_candidates(output, iteration);
        let events = self.store_candidates(candidates, iteration)?;
        tracing::debug!(
            "Extracted {} episodic memories from iteration {}",
            events.iter().filter(|e| e.is_added()).count(),
            iteration
        );
        Ok(events)
    }

    /// Extract semantic facts from free text.
    pub fn extract_facts(&self, text: &str, iteration: u64) -> Result<Vec<MemoryEvent>> {
        let candidates = fact_candidates(text);
        let events = self.store_candidates(candidates, iteration)?;
        tracing::debug!(
            "Extracted {} facts from iteration {}",
            events.iter().filter(|e| e.is_added()).count(),
            iteration
        );
        Ok(events)
    }

    fn store_candidates(
        &self,
        candidates: Vec<ExtractedMemory>,
        iteration: u64,
    ) -> Result<Vec<MemoryEvent>> {
        candidates
            .into_iter()
            .map(|c| {
                self.add(
                    &c.content,
                    AddOptions::new(c.tier, c.category).at_iteration(iteration),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedIteration, ListOptions, MemoryConfig};
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, MemoryStore) {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(9), MemoryConfig::default()).unwrap();
        (temp, store)
    }

    fn contents(found: &[ExtractedMemory], category: Category) -> Vec<&str> {
        found
            .iter()
            .filter(|m| m.category == category)
            .map(|m| m.content.as_str())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(episodic_candidates("", 1).is_empty());
        assert!(episodic_candidates("   \n", 1).is_empty());
        assert!(fact_candidates("").is_empty());

        let (temp, store) = store();
        assert!(store.extract_from_output("", 3).unwrap().is_empty());
        assert!(store.extract_facts("", 3).unwrap().is_empty());
        assert!(!store.log().path(MemoryTier::Episodic).exists());
        drop(temp);
    }

    #[test]
    fn test_file_changes_aggregated() {
        let output =
            "Created file `src/main.rs` and modified lib.rs. See https://example.com/page.html";
        let found = episodic_candidates(output, 3);
        assert_eq!(
            contents(&found, Category::FileChanges),
            vec!["Files touched in iteration 3: lib.rs, src/main.rs"]
        );
        assert!(found.iter().all(|m| m.tier == MemoryTier::Episodic));
    }

    #[test]
    fn test_file_changes_skip_urls() {
        let found = episodic_candidates("downloaded from https://example.com/archive.tar", 1);
        assert!(contents(&found, Category::FileChanges).is_empty());
    }

    #[test]
    fn test_errors_capped_and_unique() {
        let mut output = String::new();
        for i in 0..7 {
            output.push_str(&format!("Error: failure number {} happened somewhere\n", i));
        }
        output.push_str("Error: failure number 0 happened somewhere\n");

        let found = episodic_candidates(&output, 2);
        let errors = contents(&found, Category::Errors);
        assert_eq!(errors.len(), MAX_ERRORS);
        assert_eq!(errors[0], "Error in iteration 2: failure number 0 happened somewhere");
        assert_eq!(errors[4], "Error in iteration 2: failure number 4 happened somewhere");
    }

    #[test]
    fn test_error_excerpt_too_short_ignored() {
        let found = episodic_candidates("Error: tiny", 1);
        assert!(contents(&found, Category::Errors).is_empty());
    }

    #[test]
    fn test_test_results_first_pattern_wins() {
        let found = episodic_candidates("test result: ok. 12 passed; 1 failed", 4);
        assert_eq!(
            contents(&found, Category::TestResults),
            vec!["Test results iteration 4: 12 passed"]
        );

        let found = episodic_candidates("test parser::roundtrip ... FAILED", 4);
        assert_eq!(
            contents(&found, Category::TestResults),
            vec!["Test results iteration 4: FAILED"]
        );

        let found = episodic_candidates("booking the token", 4);
        assert!(contents(&found, Category::TestResults).is_empty());
    }

    #[test]
    fn test_completion_marker() {
        let found = episodic_candidates("all done <promise>COMPLETE</promise>", 6);
        assert_eq!(
            contents(&found, Category::Progress),
            vec!["Completion promise detected in iteration 6"]
        );
    }

    #[test]
    fn test_git_operations() {
        let output = "ran git commit -m \"fix parser\"\nthen git push origin main";
        let found = episodic_candidates(output, 5);
        let git: Vec<_> =
            found.iter().filter(|m| m.rule == "git").map(|m| m.content.as_str()).collect();
        assert_eq!(
            git,
            vec![
                "Git operation iter 5: git commit -m \"fix parser\"",
                "Git operation iter 5: git push origin main",
            ]
        );
    }

    #[test]
    fn test_fact_rules() {
        let found = fact_candidates("The project uses tokio for the async runtime.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::Dependencies);
        assert_eq!(found[0].content, "tokio for the async runtime.");
        assert_eq!(found[0].tier, MemoryTier::Semantic);

        let found = fact_candidates("The main file is `src/lib.rs`");
        assert_eq!(contents(&found, Category::TaskContext), vec!["src/lib.rs"]);

        let found = fact_candidates("To fix the flaky test, retry the connection");
        assert_eq!(
            contents(&found, Category::Patterns),
            vec!["the flaky test, retry the connection"]
        );

        let found = fact_candidates("We decided to use JSONL for storage");
        assert_eq!(contents(&found, Category::Decisions), vec!["use JSONL for storage"]);
    }

    #[test]
    fn test_fact_excerpt_is_bounded() {
        let long = format!("We decided to {}", "x".repeat(300));
        let found = fact_candidates(&long);
        assert_eq!(found.len(), 1);
        assert!(found[0].content.chars().count() <= FACT_EXCERPT);
    }

    #[test]
    fn test_extract_writes_through_dedup() {
        let (_temp, store) = store();
        let output =
            "Error: database connection refused on startup\n12 passed\n<promise>DONE</promise>";

        let first = store.extract_from_output(output, 7).unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(MemoryEvent::is_added));

        let episodic = store.get_all(&ListOptions::tier(MemoryTier::Episodic, 10)).unwrap();
        assert_eq!(episodic.len(), 3);
        assert!(episodic.iter().all(|m| m.origin_iteration == 7));

        let second = store.extract_from_output(output, 7).unwrap();
        assert!(second.iter().all(MemoryEvent::is_duplicate));
        assert_eq!(store.get_all(&ListOptions::tier(MemoryTier::Episodic, 10)).unwrap().len(), 3);
    }

    #[test]
    fn test_extract_facts_to_semantic() {
        let (_temp, store) = store();
        let events = store
            .extract_facts(
                "The repo depends on serde for encoding. We chose to keep JSONL logs.",
                2,
            )
            .unwrap();
        assert_eq!(events.len(), 2);

        let semantic = store.get_all(&ListOptions::tier(MemoryTier::Semantic, 10)).unwrap();
        assert_eq!(semantic.len(), 2);
        assert!(semantic.iter().all(|m| m.origin_iteration == 2));
        assert!(semantic.iter().any(|m| m.category == Category::Decisions));
        assert!(semantic.iter().any(|m| m.category == Category::Dependencies));
    }
}
