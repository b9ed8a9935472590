//! Maintenance commands run between iterations: decay, promotion and
//! clearing tiers.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use itermem_core::{MemoryStore, MemoryTier};

use super::short_id;

/// Apply temporal decay to old memory scores.
pub fn decay(store: &MemoryStore) -> Result<()> {
    let count = store.apply_decay().context("Failed to apply decay")?;
    println!("{} Decay applied to {} memories", "✓".green(), count);
    Ok(())
}

/// Promote frequently accessed episodic memories to semantic.
pub fn promote(store: &MemoryStore, min_access: Option<u32>) -> Result<()> {
    let min_access = min_access.unwrap_or(store.config().promote_min_access);
    let promoted = store.promote(min_access).context("Failed to promote memories")?;

    println!(
        "{} Promoted {} memories from {} → {}",
        "✓".green(),
        promoted.len(),
        "episodic".dimmed(),
        "semantic".green()
    );
    for id in &promoted {
        println!("  • {}", short_id(id));
    }
    Ok(())
}

/// Clear every tier.
pub fn reset(store: &MemoryStore, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to clear all memories without --yes");
    }

    store.reset(None).context("Failed to reset memory bank")?;
    println!("{} Memory bank cleared", "✓".green());
    Ok(())
}

/// Clear a single tier.
pub fn clear(store: &MemoryStore, tier: MemoryTier) -> Result<()> {
    store
        .reset(Some(tier))
        .with_context(|| format!("Failed to clear {} memory", tier))?;
    println!("{} {} memory cleared", "✓".green(), capitalize(tier.as_str()));
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
