use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::BYTES_PER_KB;
use crate::external_sort::constants::*;
use crate::utils::system::memory_budget_bytes;

/// How chunk boundaries are chosen while partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Flush when the read offset passes `c * total_bytes / N`.
    ByteOffset,
    /// Count data lines first, then flush after every `L / N` lines.
    LineCount,
}

impl Default for PartitionStrategy {
    fn default() -> Self {
        PartitionStrategy::ByteOffset
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSortConfig {
    pub partitions: usize,
    pub strategy: PartitionStrategy,
    pub io_buffer_size_kb: usize,
    pub merge_buffer_size_kb: usize,
    pub memory_usage_percent: f64,
    pub temp_directory: PathBuf,
    /// Comment text written after `# ` at the top of every chunk and output.
    pub chunk_header: String,
    pub keep_chunks: bool,
    pub verbose: bool,
}

impl Default for ExternalSortConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
            strategy: PartitionStrategy::default(),
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            merge_buffer_size_kb: DEFAULT_MERGE_BUFFER_SIZE_KB,
            memory_usage_percent: DEFAULT_MEMORY_USAGE_PERCENT,
            temp_directory: std::env::temp_dir().join(TEMP_DIR_NAME),
            chunk_header: DEFAULT_CHUNK_HEADER.to_string(),
            keep_chunks: false,
            verbose: false,
        }
    }
}

impl ExternalSortConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.partitions < MIN_PARTITIONS || self.partitions > MAX_PARTITIONS {
            return Err(anyhow::anyhow!(
                "Partition count must be between {} and {}",
                MIN_PARTITIONS, MAX_PARTITIONS
            ));
        }

        if self.io_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB
            || self.merge_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.merge_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB {
            return Err(anyhow::anyhow!(
                "IO buffer sizes must be between {} and {} KB",
                MIN_IO_BUFFER_SIZE_KB, MAX_IO_BUFFER_SIZE_KB
            ));
        }

        if self.memory_usage_percent < MIN_MEMORY_USAGE_PERCENT
            || self.memory_usage_percent > MAX_MEMORY_USAGE_PERCENT {
            return Err(anyhow::anyhow!(
                "Memory usage percent must be between {} and {}",
                MIN_MEMORY_USAGE_PERCENT, MAX_MEMORY_USAGE_PERCENT
            ));
        }

        if self.chunk_header.contains('\n') {
            return Err(anyhow::anyhow!("Chunk header must be a single line"));
        }

        Ok(())
    }

    pub fn memory_limit_bytes(&self) -> usize {
        memory_budget_bytes(self.memory_usage_percent)
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }

    pub fn merge_buffer_size_bytes(&self) -> usize {
        self.merge_buffer_size_kb * BYTES_PER_KB
    }

    pub fn chunk_path(&self, partition: usize) -> PathBuf {
        self.temp_directory.join(format!(
            "{}{:04}{}",
            CHUNK_FILE_PREFIX, partition, CHUNK_FILE_EXTENSION
        ))
    }
}
