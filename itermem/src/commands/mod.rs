//! Command implementations for the itermem CLI.
//!
//! Each submodule implements the logic for a command group. Shared output
//! helpers live here.

pub mod extract;
pub mod maintain;
pub mod memory;
pub mod report;

use anyhow::{Context, Result};
use colored::{Color, Colorize};
use itermem_core::{MemoryEvent, MemoryRecord, MemoryTier};
use serde::Serialize;

use crate::cli::{Commands, joined};
use crate::config::Config;
use crate::storage::open_store;

/// Execute a store command.
pub fn execute(command: Commands, config: &Config, iteration: Option<u64>) -> Result<()> {
    if let Commands::Version = command {
        println!("itermem {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let store = open_store(config, iteration)?;

    match command {
        Commands::Add {
            text,
            category,
            tier,
            no_dedup,
            json,
        } => memory::add(&store, &joined(&text), tier, category, no_dedup, json),
        Commands::Search {
            query,
            tier,
            category,
            limit,
            threshold,
            json,
        } => memory::search(&store, &joined(&query), tier, category, limit, threshold, json),
        Commands::Get { id, json } => memory::get(&store, &id, json),
        Commands::List {
            tier,
            category,
            limit,
            json,
        } => memory::list(&store, tier, category, limit, json),
        Commands::Update { id, text } => memory::update(&store, &id, &joined(&text)),
        Commands::Delete { id } => memory::delete(&store, &id),
        Commands::Touch { id } => memory::touch(&store, &id),
        Commands::History { id, json } => memory::history(&store, &id, json),

        Commands::Stats { json } => report::stats(&store, json),
        Commands::Show { query } => report::show(&store, query.as_deref()),

        Commands::Extract { file } => extract::episodic(&store, config, file.as_deref()),
        Commands::ExtractFacts { file } => extract::facts(&store, config, file.as_deref()),

        Commands::Decay => maintain::decay(&store),
        Commands::Promote { min_access } => maintain::promote(&store, min_access),
        Commands::Reset { yes } => maintain::reset(&store, yes),
        Commands::Clear { tier } => maintain::clear(&store, tier),

        Commands::Version => Ok(()),
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Display color for a tier.
pub fn tier_color(tier: MemoryTier) -> Color {
    match tier {
        MemoryTier::Working => Color::Yellow,
        MemoryTier::Episodic => Color::Cyan,
        MemoryTier::Semantic => Color::Green,
        MemoryTier::Procedural => Color::Magenta,
    }
}

/// Truncate to `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// First eight characters of an id.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Print a memory record with formatting.
pub fn print_memory_entry(index: usize, entry: &MemoryRecord, relevance: Option<f64>) {
    println!(
        "  {}. {} [{}] <{}> iter={}",
        index,
        short_id(&entry.id).cyan(),
        entry.tier.as_str().color(tier_color(entry.tier)),
        entry.category.as_str().dimmed(),
        entry.origin_iteration
    );

    println!("     {}", truncate(&entry.content, 200));

    match relevance {
        Some(rel) => println!("     Relevance: {:.2}  Score: {:.2}", rel, entry.score),
        None => println!("     Score: {:.2}  Accessed: {}", entry.score, entry.access_count),
    }

    if let Some(source) = entry.promoted_from() {
        println!("     Promoted from: {}", short_id(source).dimmed());
    }

    println!();
}

/// Report the outcome of a mutation.
pub fn print_event(event: &MemoryEvent) {
    match event {
        MemoryEvent::Added { id, tier, .. } => {
            println!(
                "{} Memory added to {}: {}",
                "✓".green(),
                tier.as_str().color(tier_color(*tier)),
                id
            );
        }
        MemoryEvent::Updated { id, old_content, content } => {
            println!("{} Updated memory: {}", "✓".green(), id);
            println!("  {} {}", "-".red(), truncate(old_content, 100).dimmed());
            println!("  {} {}", "+".green(), truncate(content, 100));
        }
        MemoryEvent::Deleted { id } => println!("{} Deleted memory: {}", "✓".green(), id),
        MemoryEvent::Accessed { id, access_count } => {
            println!("{} Recorded access to {} (count: {})", "✓".green(), id, access_count);
        }
        MemoryEvent::Skipped { reason } => println!("{} Skipped: {}", "⚠".yellow(), reason),
    }
}
