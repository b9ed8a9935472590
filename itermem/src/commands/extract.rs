//! Extraction commands: mine iteration output for memories and facts.
//!
//! Output is read from `--file` when given, otherwise from the first
//! non-empty of the iteration's log, the last-output log and `output.txt`
//! under the base directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use itermem_core::{MemoryEvent, MemoryStore};

use super::truncate;
use crate::config::Config;

/// Extract episodic memories from the current iteration's output.
pub fn episodic(store: &MemoryStore, config: &Config, file: Option<&Path>) -> Result<()> {
    let iteration = store.current_iteration();
    let Some(output) = read_output(config, file, iteration)? else {
        bail!("No output file found for extraction");
    };

    let events = store
        .extract_from_output(&output, iteration)
        .context("Failed to extract memories")?;
    report(&events, "memories", iteration);
    Ok(())
}

/// Extract semantic facts from the current iteration's output.
pub fn facts(store: &MemoryStore, config: &Config, file: Option<&Path>) -> Result<()> {
    let iteration = store.current_iteration();
    let Some(output) = read_output(config, file, iteration)? else {
        bail!("No output file found for fact extraction");
    };

    let events = store
        .extract_facts(&output, iteration)
        .context("Failed to extract facts")?;
    report(&events, "facts", iteration);
    Ok(())
}

/// Read iteration output. Returns `None` when no candidate has content.
fn read_output(config: &Config, file: Option<&Path>, iteration: u64) -> Result<Option<String>> {
    let candidates: Vec<PathBuf> = match file {
        Some(path) => vec![path.to_path_buf()],
        None => config.output_candidates(iteration),
    };

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        if !text.trim().is_empty() {
            tracing::debug!("Reading iteration output from {}", path.display());
            return Ok(Some(text.into_owned()));
        }
    }

    Ok(None)
}

fn report(events: &[MemoryEvent], noun: &str, iteration: u64) {
    let added: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            MemoryEvent::Added { category, content, .. } => Some((category, content)),
            _ => None,
        })
        .collect();
    let skipped = events.len() - added.len();

    println!(
        "{} Extracted {} {} from iteration {}",
        "✓".green(),
        added.len(),
        noun,
        iteration
    );
    for (category, content) in added {
        println!("  [{}] {}", category.as_str().cyan(), truncate(content, 120));
    }
    if skipped > 0 {
        println!("  {}", format!("{} already known", skipped).dimmed());
    }
}
