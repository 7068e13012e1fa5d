use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::{PERCENT_100, PROGRESS_REPORT_INTERVAL_RECORDS, SHUTDOWN_CHECK_INTERVAL_RECORDS};
use crate::error::{EdgeError, Result};
use crate::external_sort::config::{ExternalSortConfig, PartitionStrategy};
use crate::external_sort::record::{parse_edge_line, write_edge, write_header};
use crate::graph::edge::Edge;
use crate::utils::io::{remove_if_exists, AtomicFile};

/// One sorted, locally deduplicated partition persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// 1-based partition index.
    pub partition: usize,
    pub file_path: PathBuf,
    pub record_count: usize,
    pub file_size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionStats {
    pub input_bytes: u64,
    pub lines_read: usize,
    pub malformed_lines: usize,
    pub self_loops: usize,
    pub records_written: usize,
    pub empty_partitions: usize,
}

#[derive(Debug, Clone)]
pub struct PartitionOutcome {
    /// Non-empty chunks only, in partition order.
    pub chunks: Vec<ChunkMetadata>,
    pub stats: PartitionStats,
}

impl PartitionOutcome {
    /// Downstream merge assumes exactly `requested` cursors.
    pub fn ensure_count(&self, requested: usize) -> Result<()> {
        if self.chunks.len() != requested {
            return Err(EdgeError::PartitionCountMismatch {
                requested,
                produced: self.chunks.len(),
            });
        }
        Ok(())
    }
}

/// Splits one edge file into N sorted chunk files, deduplicating inside
/// each chunk only. Cross-chunk duplicates are left for the merge.
pub struct ChunkPartitioner {
    config: ExternalSortConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl ChunkPartitioner {
    pub fn new(config: ExternalSortConfig) -> Self {
        Self {
            config,
            shutdown_flag: None,
        }
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(shutdown_flag);
        self
    }

    /// Chunks written before a failure are removed before the error returns.
    pub fn partition(&self, input: &Path) -> Result<PartitionOutcome> {
        let mut chunks = Vec::with_capacity(self.config.partitions.max(1));
        match self.partition_into(input, &mut chunks) {
            Ok(stats) => Ok(PartitionOutcome { chunks, stats }),
            Err(e) => {
                warn!("Partitioning failed, removing {} chunks: {}", chunks.len(), e);
                self.cleanup_all_chunks(&chunks);
                Err(e)
            }
        }
    }

    fn partition_into(&self, input: &Path, chunks: &mut Vec<ChunkMetadata>) -> Result<PartitionStats> {
        let partitions = self.config.partitions.max(1);
        let total_bytes = std::fs::metadata(input)?.len();
        let total_lines = match self.config.strategy {
            PartitionStrategy::LineCount => count_data_lines(input, self.config.io_buffer_size_bytes())?,
            PartitionStrategy::ByteOffset => 0,
        };

        info!(
            "Partitioning {} ({} bytes) into {} chunks by {:?}",
            input.display(),
            total_bytes,
            partitions,
            self.config.strategy
        );

        let file = File::open(input)?;
        let mut reader = BufReader::with_capacity(self.config.io_buffer_size_bytes(), file);
        let mut stats = PartitionStats {
            input_bytes: total_bytes,
            ..Default::default()
        };

        let mut current = 1;
        let mut active: HashSet<Edge> = HashSet::new();
        let mut offset: u64 = 0;
        let mut line_number = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            offset += read as u64;
            line_number += 1;
            if line_number == 1 {
                continue;
            }
            stats.lines_read += 1;

            if stats.lines_read % SHUTDOWN_CHECK_INTERVAL_RECORDS == 0 && self.shutdown_requested() {
                warn!("Partitioning interrupted at line {}", line_number);
                return Err(EdgeError::Interrupted);
            }

            match parse_edge_line(&buf, line_number) {
                Ok(edge) => {
                    active.insert(edge);
                }
                Err(EdgeError::SelfLoop { entity }) => {
                    stats.self_loops += 1;
                    warn!("Skipping self-loop on {} at line {}", entity, line_number);
                }
                Err(e) if e.is_recoverable() => {
                    stats.malformed_lines += 1;
                    warn!("Skipping line: {}", e);
                }
                Err(e) => return Err(e),
            }

            if stats.lines_read % PROGRESS_REPORT_INTERVAL_RECORDS == 0 {
                info!(
                    "Read {:.1}% of input",
                    offset as f64 * PERCENT_100 / total_bytes.max(1) as f64
                );
            }

            let crossed = match self.config.strategy {
                PartitionStrategy::ByteOffset => {
                    (offset as u128) > (current as u128) * (total_bytes as u128) / (partitions as u128)
                }
                PartitionStrategy::LineCount => {
                    (stats.lines_read as u128) * (partitions as u128) >= (current as u128) * (total_lines as u128)
                }
            };
            if crossed && current < partitions {
                self.flush(current, &mut active, chunks, &mut stats)?;
                current += 1;
            }
        }

        self.flush(current, &mut active, chunks, &mut stats)?;

        info!(
            "Partitioning done: {} lines, {} chunks, {} records, {} malformed, {} self-loops",
            stats.lines_read,
            chunks.len(),
            stats.records_written,
            stats.malformed_lines,
            stats.self_loops
        );

        Ok(stats)
    }

    fn flush(
        &self,
        partition: usize,
        active: &mut HashSet<Edge>,
        chunks: &mut Vec<ChunkMetadata>,
        stats: &mut PartitionStats,
    ) -> Result<()> {
        let mut records: Vec<Edge> = std::mem::take(active).into_iter().collect();
        if records.is_empty() {
            stats.empty_partitions += 1;
            debug!("Partition {} is empty, no chunk written", partition);
            return Ok(());
        }
        records.par_sort_unstable();

        let chunk_path = self.config.chunk_path(partition);
        let mut file = AtomicFile::create(&chunk_path, self.config.io_buffer_size_bytes())?;
        write_header(&mut file, &self.config.chunk_header)?;
        for edge in &records {
            write_edge(&mut file, edge)?;
        }
        let file_size_bytes = file.commit()?;

        debug!(
            "Wrote chunk {} with {} records to {}",
            partition,
            records.len(),
            chunk_path.display()
        );

        stats.records_written += records.len();
        chunks.push(ChunkMetadata {
            partition,
            file_path: chunk_path,
            record_count: records.len(),
            file_size_bytes,
        });
        Ok(())
    }

    pub fn cleanup_chunk(&self, chunk: &ChunkMetadata) -> Result<()> {
        remove_if_exists(&chunk.file_path)?;
        Ok(())
    }

    pub fn cleanup_all_chunks(&self, chunks: &[ChunkMetadata]) {
        for chunk in chunks {
            if let Err(e) = self.cleanup_chunk(chunk) {
                warn!("Failed to cleanup chunk {}: {}", chunk.partition, e);
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

/// Lines after the header, counting a final unterminated line.
fn count_data_lines(path: &Path, io_buffer_size: usize) -> Result<usize> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(io_buffer_size, file);
    let mut buf = Vec::new();
    let mut lines: usize = 0;
    while reader.read_until(b'\n', &mut buf)? > 0 {
        lines += 1;
        buf.clear();
    }
    Ok(lines.saturating_sub(1))
}
