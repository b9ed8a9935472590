//! Append-only JSONL log per memory tier.
//!
//! Each line holds one independently decodable record. Lines that fail to
//! decode are skipped on read; their siblings still load.

use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{MemoryRecord, MemoryTier, clamp_score};

/// File-backed storage for the four tier logs.
#[derive(Debug, Clone)]
pub struct TierLog {
    dir: PathBuf,
}

impl TierLog {
    /// Open (creating if needed) the log directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if dir.exists() && !dir.is_dir() {
            return Err(Error::config(format!(
                "Memory path is not a directory: {}",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the tier logs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a tier's log file.
    pub fn path(&self, tier: MemoryTier) -> PathBuf {
        self.dir.join(format!("{}.jsonl", tier.as_str()))
    }

    /// Read every decodable record of a tier, in file order.
    pub fn read_all(&self, tier: MemoryTier) -> Result<Vec<MemoryRecord>> {
        let path = self.path(tier);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<MemoryRecord>(line) {
                Ok(mut record) => {
                    record.score = clamp_score(record.score);
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping corrupt {} memory line {}: {}",
                        tier,
                        index + 1,
                        e
                    );
                }
            }
        }

        Ok(records)
    }

    /// Append a record, then enforce the tier capacity.
    ///
    /// Returns the number of records evicted.
    pub fn append(
        &self,
        tier: MemoryTier,
        record: &MemoryRecord,
        capacity: usize,
    ) -> Result<usize> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(tier))?;
        file.write_all(line.as_bytes())?;
        drop(file);

        self.enforce_capacity(tier, capacity)
    }

    /// Replace a tier's contents.
    pub fn overwrite(&self, tier: MemoryTier, records: &[MemoryRecord]) -> Result<()> {
        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path(tier);
        let tmp = path.with_extension("jsonl.tmp");
        fs::write(&tmp, buf)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove a tier's log. Returns whether a file existed.
    pub fn clear(&self, tier: MemoryTier) -> Result<bool> {
        match fs::remove_file(self.path(tier)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn enforce_capacity(&self, tier: MemoryTier, capacity: usize) -> Result<usize> {
        let mut records = self.read_all(tier)?;
        if records.len() <= capacity {
            return Ok(0);
        }

        let evicted = records.len() - capacity;
        records.sort_by(retention_order);
        records.truncate(capacity);
        self.overwrite(tier, &records)?;

        tracing::debug!("Evicted {} {} memories over capacity {}", evicted, tier, capacity);
        Ok(evicted)
    }
}

/// Highest score first, newest first among equal scores.
pub fn retention_order(a: &MemoryRecord, b: &MemoryRecord) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
