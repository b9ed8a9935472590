//! CLI argument definitions using clap derive macros.
//!
//! Command structure for recording and maintaining iteration memories.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use itermem_core::{Category, MemoryTier};

/// Tiered memory for iterative agent loops
///
/// Records what happened in each iteration, extracts facts from agent output
/// and renders the memory block injected into the next prompt.
#[derive(Parser, Debug)]
#[command(name = "itermem")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory (memory logs live in <dir>/memory)
    #[arg(long, global = true, env = "ITERMEM_DIR")]
    pub dir: Option<PathBuf>,

    /// Current iteration (overrides the state file)
    #[arg(long, global = true)]
    pub iteration: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────
    /// Add a memory
    Add {
        /// Memory text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Category
        #[arg(short, long, default_value = "progress")]
        category: Category,

        /// Tier
        #[arg(short, long, default_value = "semantic")]
        tier: MemoryTier,

        /// Store even if a matching memory exists
        #[arg(long)]
        no_dedup: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search memories by relevance
    Search {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Only search this tier
        #[arg(short, long)]
        tier: Option<MemoryTier>,

        /// Only search this category
        #[arg(short, long)]
        category: Option<Category>,

        /// Maximum results (defaults to the configured search limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum relevance (defaults to the configured threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single memory
    Get {
        /// Memory ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List memories, newest first
    List {
        /// Only list this tier
        #[arg(short, long)]
        tier: Option<MemoryTier>,

        /// Only list this category
        #[arg(short, long)]
        category: Option<Category>,

        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the content of a memory
    Update {
        /// Memory ID
        id: String,

        /// New text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a memory
    Delete {
        /// Memory ID
        id: String,
    },

    /// Record an access to a memory (counts toward promotion)
    Touch {
        /// Memory ID
        id: String,
    },

    /// Show the content history of a memory
    History {
        /// Memory ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────
    /// Show memory bank statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the memory block as injected into agent prompts
    Show {
        /// Rank episodic and semantic memories against this query
        #[arg(short, long)]
        query: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Extraction
    // ─────────────────────────────────────────────────────────────────────────
    /// Extract episodic memories from iteration output
    Extract {
        /// Output file (defaults to the iteration's output log)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Extract semantic facts from iteration output
    ExtractFacts {
        /// Output file (defaults to the iteration's output log)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────
    /// Apply temporal decay to old memory scores
    Decay,

    /// Promote frequently accessed episodic memories to semantic
    Promote {
        /// Minimum access count (defaults to the configured value)
        #[arg(short, long)]
        min_access: Option<u32>,
    },

    /// Clear every tier
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Clear a single tier
    Clear {
        /// Tier to clear
        tier: MemoryTier,
    },

    /// Show version
    Version,
}

/// Join multi-word positional text.
pub fn joined(words: &[String]) -> String {
    words.join(" ")
}
