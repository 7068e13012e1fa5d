use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::BYTES_PER_MB;
use crate::error::{EdgeError, Result};
use crate::external_sort::chunk::{ChunkMetadata, ChunkPartitioner, PartitionStats};
use crate::external_sort::merger::{KWayMergeDeduplicator, MergeStats};
use crate::external_sort::ExternalSortConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub input_bytes: u64,
    pub lines_read: usize,
    pub malformed_lines: usize,
    pub self_loops: usize,
    pub records_partitioned: usize,
    pub chunks_created: usize,
    pub unique_records: usize,
    pub duplicates_removed: usize,
    pub truncated_chunks: usize,
    pub output_bytes: u64,
    pub partition_time_ms: u64,
    pub merge_time_ms: u64,
    pub processing_time_ms: u64,
}

impl DedupStats {
    fn absorb_partition(&mut self, stats: &PartitionStats, chunks: usize) {
        self.input_bytes = stats.input_bytes;
        self.lines_read = stats.lines_read;
        self.malformed_lines = stats.malformed_lines;
        self.self_loops = stats.self_loops;
        self.records_partitioned = stats.records_written;
        self.chunks_created = chunks;
    }

    fn absorb_merge(&mut self, stats: &MergeStats) {
        self.unique_records = stats.unique_records;
        self.duplicates_removed = stats.duplicates_removed;
        self.truncated_chunks = stats.truncated_chunks;
        self.output_bytes = stats.output_bytes;
    }
}

/// Drives partition then merge for one edge file.
pub struct EdgeDedupProcessor {
    config: ExternalSortConfig,
    partitioner: ChunkPartitioner,
    shutdown_flag: Arc<AtomicBool>,
}

impl EdgeDedupProcessor {
    pub fn new(config: ExternalSortConfig) -> anyhow::Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.temp_directory)?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let partitioner = ChunkPartitioner::new(config.clone()).with_shutdown_signal(shutdown_flag.clone());

        Ok(Self {
            config,
            partitioner,
            shutdown_flag,
        })
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.partitioner = ChunkPartitioner::new(self.config.clone()).with_shutdown_signal(shutdown_flag.clone());
        self.shutdown_flag = shutdown_flag;
        self
    }

    pub fn config(&self) -> &ExternalSortConfig {
        &self.config
    }

    pub fn process(&self, input: &Path, output: &Path) -> Result<DedupStats> {
        let start = Instant::now();
        let mut stats = DedupStats::default();

        info!(
            "Deduplicating {} into {} using {} partitions",
            input.display(),
            output.display(),
            self.config.partitions
        );
        debug!(
            "Memory budget: {:.1} MB",
            self.config.memory_limit_bytes() as f64 / BYTES_PER_MB as f64
        );

        let outcome = self.partitioner.partition(input)?;
        stats.absorb_partition(&outcome.stats, outcome.chunks.len());
        stats.partition_time_ms = start.elapsed().as_millis() as u64;

        if self.config.verbose {
            for chunk in &outcome.chunks {
                info!(
                    "Chunk {}: {} records, {} bytes",
                    chunk.partition, chunk.record_count, chunk.file_size_bytes
                );
            }
        }

        if let Err(e) = outcome.ensure_count(self.config.partitions) {
            warn!("{}; removing chunks", e);
            self.partitioner.cleanup_all_chunks(&outcome.chunks);
            return Err(e);
        }

        let merge_start = Instant::now();
        let merged = self.merge_chunks(&outcome.chunks, output);
        self.finish_chunks(&outcome.chunks);
        stats.absorb_merge(&merged?);
        stats.merge_time_ms = merge_start.elapsed().as_millis() as u64;
        stats.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Done in {} ms: {} lines read, {} unique edges, {} duplicates removed",
            stats.processing_time_ms, stats.lines_read, stats.unique_records, stats.duplicates_removed
        );
        Ok(stats)
    }

    /// Merges chunk files left by an earlier run. The files are not removed.
    pub fn merge_existing(&self, chunk_paths: &[PathBuf], output: &Path) -> Result<DedupStats> {
        let start = Instant::now();
        info!("Merging {} existing chunks into {}", chunk_paths.len(), output.display());

        let merged = self.merger_for(chunk_paths)?.merge_to_file(
            output,
            &self.config.chunk_header,
            self.config.merge_buffer_size_bytes(),
        )?;

        let mut stats = DedupStats {
            chunks_created: chunk_paths.len(),
            ..Default::default()
        };
        stats.absorb_merge(&merged);
        stats.merge_time_ms = start.elapsed().as_millis() as u64;
        stats.processing_time_ms = stats.merge_time_ms;
        Ok(stats)
    }

    fn merge_chunks(&self, chunks: &[ChunkMetadata], output: &Path) -> Result<MergeStats> {
        if self.shutdown_flag.load(Ordering::Relaxed) {
            return Err(EdgeError::Interrupted);
        }
        let paths: Vec<PathBuf> = chunks.iter().map(|c| c.file_path.clone()).collect();
        self.merger_for(&paths)?.merge_to_file(
            output,
            &self.config.chunk_header,
            self.config.merge_buffer_size_bytes(),
        )
    }

    fn merger_for(&self, chunk_paths: &[PathBuf]) -> Result<KWayMergeDeduplicator> {
        Ok(KWayMergeDeduplicator::open(chunk_paths, self.config.io_buffer_size_bytes())?
            .with_shutdown_signal(self.shutdown_flag.clone()))
    }

    fn finish_chunks(&self, chunks: &[ChunkMetadata]) {
        if self.config.keep_chunks {
            info!(
                "Keeping {} chunks in {}",
                chunks.len(),
                self.config.temp_directory.display()
            );
            return;
        }
        self.partitioner.cleanup_all_chunks(chunks);
        // Only succeeds when nothing else lives there
        let _ = std::fs::remove_dir(&self.config.temp_directory);
    }
}
