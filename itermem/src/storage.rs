//! Store construction for CLI commands.
//!
//! Every command opens the JSONL store under `<base>/memory`. The current
//! iteration comes from `--iteration` when given, otherwise from the
//! orchestrator's state file.

use anyhow::{Context, Result};
use itermem_core::{FixedIteration, IterationSource, MemoryStore, StateFileIteration};

use crate::config::Config;

/// Open the memory store described by the configuration.
pub fn open_store(config: &Config, iteration: Option<u64>) -> Result<MemoryStore> {
    let dir = config.memory_dir();
    let source: Box<dyn IterationSource> = match iteration {
        Some(n) => Box::new(FixedIteration(n)),
        None => Box::new(StateFileIteration::new(config.state_file())),
    };

    MemoryStore::open(dir.clone(), source, config.memory.clone())
        .with_context(|| format!("Failed to open memory store at {}", dir.display()))
}
