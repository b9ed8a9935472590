//! Reporting commands: statistics and the prompt memory block.

use anyhow::{Context, Result};
use colored::Colorize;
use itermem_core::{MemoryStore, MemoryTier};

use super::{print_json, tier_color};

/// Show memory bank statistics.
pub fn stats(store: &MemoryStore, json: bool) -> Result<()> {
    let stats = store.stats().context("Failed to get memory stats")?;

    if json {
        return print_json(&stats);
    }

    println!("{} Memory Bank Statistics", "📊".cyan());
    println!();
    println!("  Total memories: {}", stats.total.to_string().bold());
    println!();
    println!("  By tier:");
    for tier in MemoryTier::ALL {
        let count = stats.tier(tier);
        if count > 0 {
            println!(
                "    {:<11} {}",
                format!("{}:", tier),
                count.to_string().color(tier_color(tier))
            );
        }
    }

    if !stats.categories.is_empty() {
        println!();
        println!("  By category:");
        for (category, count) in &stats.categories {
            println!("    {:<13} {}", format!("{}:", category), count);
        }
    }

    Ok(())
}

/// Print the memory block injected into agent prompts.
pub fn show(store: &MemoryStore, query: Option<&str>) -> Result<()> {
    let block = store
        .format_for_context(query)
        .context("Failed to format memories")?;

    if block.is_empty() {
        println!("{} No memories stored yet", "⚠".yellow());
    } else {
        println!("{}", block);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use itermem_core::{AddOptions, Category, FixedIteration, MemoryConfig};
    use tempfile::tempdir;

    #[test]
    fn test_reports_on_empty_and_filled_store() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store =
            MemoryStore::open(temp.path(), FixedIteration(1), MemoryConfig::default()).unwrap();

        assert!(stats(&store, false).is_ok());
        assert!(show(&store, None).is_ok());

        store.add("parser rewrite finished", AddOptions::episodic(Category::Progress)).unwrap();
        assert!(stats(&store, true).is_ok());
        assert!(show(&store, Some("parser")).is_ok());
    }
}
