//! Seams between the memory store and the orchestrator that drives it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Iteration assumed when no orchestrator state is available.
pub const DEFAULT_ITERATION: u64 = 1;

/// Supplies the orchestrator's current iteration.
///
/// Consulted on every add, search and decay call; implementations must not
/// cache a stale value.
pub trait IterationSource: Send + Sync {
    fn current_iteration(&self) -> u64;
}

impl<T: IterationSource + ?Sized> IterationSource for Arc<T> {
    fn current_iteration(&self) -> u64 {
        (**self).current_iteration()
    }
}

impl<T: IterationSource + ?Sized> IterationSource for Box<T> {
    fn current_iteration(&self) -> u64 {
        (**self).current_iteration()
    }
}

/// A constant iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIteration(pub u64);

impl IterationSource for FixedIteration {
    fn current_iteration(&self) -> u64 {
        self.0
    }
}

/// Shared, settable iteration counter.
///
/// Clones observe the same counter, so an embedder can keep one handle and
/// give another to the store.
#[derive(Debug, Clone)]
pub struct ManualIteration(Arc<AtomicU64>);

impl ManualIteration {
    pub fn new(iteration: u64) -> Self {
        Self(Arc::new(AtomicU64::new(iteration)))
    }

    pub fn set(&self, iteration: u64) {
        self.0.store(iteration, Ordering::SeqCst);
    }

    /// Move to the next iteration and return it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for ManualIteration {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION)
    }
}

impl IterationSource for ManualIteration {
    fn current_iteration(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reads the `iteration` key of the orchestrator's JSON state file.
///
/// A missing, unreadable or malformed state file yields [`DEFAULT_ITERATION`].
#[derive(Debug, Clone)]
pub struct StateFileIteration {
    path: PathBuf,
}

impl StateFileIteration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IterationSource for StateFileIteration {
    fn current_iteration(&self) -> u64 {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return DEFAULT_ITERATION;
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(state) => state
                .get("iteration")
                .and_then(|v| v.as_u64())
                .unwrap_or(DEFAULT_ITERATION),
            Err(e) => {
                tracing::warn!("Ignoring malformed state file {}: {}", self.path.display(), e);
                DEFAULT_ITERATION
            }
        }
    }
}
