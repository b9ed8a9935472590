//! Record commands: add, search, inspect and edit individual memories.
//!
//! All operations go straight to the JSONL store; nothing is cached between
//! invocations.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use itermem_core::{
    AddOptions, Category, ListOptions, MemoryEvent, MemoryStore, MemoryTier, SearchOptions,
};

use super::{print_event, print_json, print_memory_entry, tier_color};

/// Add a memory from the command line.
pub fn add(
    store: &MemoryStore,
    text: &str,
    tier: MemoryTier,
    category: Category,
    no_dedup: bool,
    json: bool,
) -> Result<()> {
    let mut options = AddOptions::new(tier, category).with_metadata("source", "cli");
    if no_dedup {
        options = options.allow_duplicates();
    }

    let event = store.add(text, options).context("Failed to add memory")?;

    if json {
        return print_json(&event);
    }
    print_event(&event);
    Ok(())
}

/// Search memories by relevance.
pub fn search(
    store: &MemoryStore,
    query: &str,
    tier: Option<MemoryTier>,
    category: Option<Category>,
    limit: Option<usize>,
    threshold: Option<f64>,
    json: bool,
) -> Result<()> {
    let defaults = SearchOptions::from_config(store.config());
    let options = SearchOptions {
        tier,
        category,
        limit: limit.unwrap_or(defaults.limit),
        threshold: threshold.unwrap_or(defaults.threshold),
    };

    let hits = store.search(query, &options).context("Failed to search memories")?;

    if json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!("{} No matching memories found", "⚠".yellow());
        return Ok(());
    }

    println!("{} Found {} memories:", "✓".green(), hits.len());
    println!();
    for (i, hit) in hits.iter().enumerate() {
        print_memory_entry(i + 1, &hit.record, Some(hit.relevance));
    }

    Ok(())
}

/// Show a single memory.
pub fn get(store: &MemoryStore, id: &str, json: bool) -> Result<()> {
    let record = store
        .get(id)
        .context("Failed to read memory")?
        .ok_or_else(|| anyhow!("Memory not found: {}", id))?;

    if json {
        return print_json(&record);
    }

    println!("{}", "Memory".bold());
    println!("  ID:         {}", record.id.cyan());
    println!("  Tier:       {}", record.tier.as_str().color(tier_color(record.tier)));
    println!("  Category:   {}", record.category);
    println!("  Iteration:  {}", record.origin_iteration);
    println!("  Score:      {:.4}", record.score);
    println!("  Accessed:   {}", record.access_count);
    println!("  Created:    {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:    {}", record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !record.metadata.is_empty() {
        let metadata =
            serde_json::to_string(&record.metadata).context("Failed to serialize metadata")?;
        println!("  Metadata:   {}", metadata.dimmed());
    }
    println!();
    println!("{}", record.content);

    Ok(())
}

/// List memories, newest first.
pub fn list(
    store: &MemoryStore,
    tier: Option<MemoryTier>,
    category: Option<Category>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let options = ListOptions { tier, category, limit };
    let records = store.get_all(&options).context("Failed to list memories")?;

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        let tier_str = tier.map(|t| t.as_str()).unwrap_or("any");
        println!("{} No {} memories found", "⚠".yellow(), tier_str);
        return Ok(());
    }

    println!("{} {} memories:", "✓".green(), records.len());
    println!();
    for (i, record) in records.iter().enumerate() {
        print_memory_entry(i + 1, record, None);
    }

    Ok(())
}

/// Replace a memory's content.
pub fn update(store: &MemoryStore, id: &str, text: &str) -> Result<()> {
    let event = store.update(id, text).context("Failed to update memory")?;
    print_event(&event);
    Ok(())
}

/// Delete a memory.
pub fn delete(store: &MemoryStore, id: &str) -> Result<()> {
    let event = store.delete(id).context("Failed to delete memory")?;
    match event {
        MemoryEvent::Skipped { .. } => println!("{} Memory not found: {}", "⚠".yellow(), id),
        event => print_event(&event),
    }
    Ok(())
}

/// Record an access to a memory.
pub fn touch(store: &MemoryStore, id: &str) -> Result<()> {
    let event = store.record_access(id).context("Failed to record access")?;
    match event {
        MemoryEvent::Skipped { .. } => println!("{} Memory not found: {}", "⚠".yellow(), id),
        event => print_event(&event),
    }
    Ok(())
}

/// Show the content history of a memory.
pub fn history(store: &MemoryStore, id: &str, json: bool) -> Result<()> {
    let entries = store.history(id).context("Failed to read memory history")?;

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("{} Memory not found: {}", "⚠".yellow(), id);
        return Ok(());
    }

    for entry in &entries {
        println!(
            "  {} created {} updated {}",
            "•".cyan(),
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!("    {}", entry.memory);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use itermem_core::{FixedIteration, MemoryConfig};
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, MemoryStore) {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(2), MemoryConfig::default()).unwrap();
        (temp, store)
    }

    #[test]
    fn test_add_tags_cli_source() {
        let (_temp, store) = store();
        add(
            &store,
            "the project uses sqlx",
            MemoryTier::Semantic,
            Category::Dependencies,
            false,
            false,
        )
        .unwrap();

        let records = store.get_all(&ListOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tier, MemoryTier::Semantic);
        assert_eq!(records[0].metadata["source"], "cli");
    }

    #[test]
    fn test_add_no_dedup_keeps_both() {
        let (_temp, store) = store();
        add(&store, "same note", MemoryTier::Working, Category::Progress, false, true).unwrap();
        add(&store, "same note", MemoryTier::Working, Category::Progress, false, true).unwrap();
        assert_eq!(store.get_all(&ListOptions::default()).unwrap().len(), 1);

        add(&store, "same note", MemoryTier::Working, Category::Progress, true, true).unwrap();
        assert_eq!(store.get_all(&ListOptions::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_get_missing_is_error() {
        let (_temp, store) = store();
        assert!(get(&store, "missing", false).is_err());
    }

    #[test]
    fn test_missing_ids_are_not_errors() {
        let (_temp, store) = store();
        assert!(delete(&store, "missing").is_ok());
        assert!(touch(&store, "missing").is_ok());
        assert!(update(&store, "missing", "text").is_ok());
        assert!(history(&store, "missing", false).is_ok());
    }

    #[test]
    fn test_touch_increments_access() {
        let (_temp, store) = store();
        let event = store.add("hot memory", AddOptions::default()).unwrap();
        let id = event.id().unwrap().to_string();

        touch(&store, &id).unwrap();
        touch(&store, &id).unwrap();
        assert_eq!(store.get(&id).unwrap().unwrap().access_count, 2);
    }

    #[test]
    fn test_search_and_list_run() {
        let (_temp, store) = store();
        store.add("authentication bug in login", AddOptions::default()).unwrap();

        assert!(search(&store, "login", None, None, None, None, false).is_ok());
        assert!(
            search(&store, "login", Some(MemoryTier::Semantic), None, Some(1), None, true).is_ok()
        );
        assert!(list(&store, None, None, 10, false).is_ok());
    }
}
