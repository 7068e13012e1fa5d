pub mod config;
pub mod constants;
pub mod processor;
pub mod record;
pub mod chunk;
pub mod reader;
pub mod merger;

#[cfg(test)]
mod tests;

pub use chunk::{ChunkMetadata, ChunkPartitioner, PartitionOutcome, PartitionStats};
pub use config::{ExternalSortConfig, PartitionStrategy};
pub use merger::{KWayMergeDeduplicator, MergeStats};
pub use processor::{DedupStats, EdgeDedupProcessor};
pub use reader::ChunkReader;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Runs the partition and merge pipeline on tokio's blocking pool.
pub async fn sort_and_deduplicate(
    input_file: &Path,
    output_file: &Path,
    config: ExternalSortConfig,
) -> Result<DedupStats> {
    sort_and_deduplicate_with_shutdown(input_file, output_file, config, Arc::new(AtomicBool::new(false))).await
}

pub async fn sort_and_deduplicate_with_shutdown(
    input_file: &Path,
    output_file: &Path,
    config: ExternalSortConfig,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<DedupStats> {
    let processor = EdgeDedupProcessor::new(config)?.with_shutdown_signal(shutdown_flag);
    let input: PathBuf = input_file.to_path_buf();
    let output: PathBuf = output_file.to_path_buf();

    let stats = tokio::task::spawn_blocking(move || processor.process(&input, &output)).await??;
    Ok(stats)
}

/// Async wrapper around `EdgeDedupProcessor::merge_existing`.
pub async fn merge_chunk_files(
    chunk_paths: Vec<PathBuf>,
    output_file: &Path,
    config: ExternalSortConfig,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<DedupStats> {
    let processor = EdgeDedupProcessor::new(config)?.with_shutdown_signal(shutdown_flag);
    let output = output_file.to_path_buf();

    let stats = tokio::task::spawn_blocking(move || processor.merge_existing(&chunk_paths, &output)).await??;
    Ok(stats)
}
