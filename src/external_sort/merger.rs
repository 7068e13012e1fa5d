use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::{PROGRESS_REPORT_INTERVAL_RECORDS, SHUTDOWN_CHECK_INTERVAL_RECORDS};
use crate::error::{EdgeError, Result};
use crate::external_sort::reader::ChunkReader;
use crate::external_sort::record::{write_edge, write_header};
use crate::graph::edge::Edge;
use crate::utils::io::AtomicFile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub chunks_merged: usize,
    pub records_in: usize,
    pub unique_records: usize,
    pub duplicates_removed: usize,
    pub truncated_chunks: usize,
    pub output_bytes: u64,
}

#[derive(Debug)]
struct MergeEntry {
    edge: Edge,
    cursor: usize,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.edge
            .cmp(&other.edge)
            .then_with(|| self.cursor.cmp(&other.cursor))
    }
}

/// Merges N sorted chunk cursors into one strictly ascending stream,
/// dropping every record equal to one already written.
pub struct KWayMergeDeduplicator {
    cursors: Vec<ChunkReader>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl KWayMergeDeduplicator {
    /// Takes ownership of already seeded cursors. Every cursor must hold a
    /// head record; an empty chunk is rejected.
    pub fn new(cursors: Vec<ChunkReader>) -> Result<Self> {
        if cursors.is_empty() {
            return Err(EdgeError::NoChunks);
        }
        if let Some(empty) = cursors.iter().find(|c| c.peek_head().is_none()) {
            return Err(EdgeError::DegenerateChunk {
                chunk: empty.path().to_path_buf(),
            });
        }
        Ok(Self {
            cursors,
            shutdown_flag: None,
        })
    }

    pub fn open(chunk_paths: &[PathBuf], io_buffer_size: usize) -> Result<Self> {
        let cursors = chunk_paths
            .iter()
            .map(|path| ChunkReader::open(path, io_buffer_size))
            .collect::<Result<Vec<_>>>()?;
        Self::new(cursors)
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(shutdown_flag);
        self
    }

    pub fn chunk_count(&self) -> usize {
        self.cursors.len()
    }

    /// Writes the merged records (no header) to `writer`.
    pub fn merge_into<W: Write>(mut self, writer: &mut W) -> Result<MergeStats> {
        let mut stats = MergeStats {
            chunks_merged: self.cursors.len(),
            ..Default::default()
        };

        let mut heap = BinaryHeap::with_capacity(self.cursors.len());
        for (cursor, reader) in self.cursors.iter().enumerate() {
            if let Some(edge) = reader.peek_head() {
                heap.push(Reverse(MergeEntry { edge: edge.clone(), cursor }));
            }
        }

        let mut last_written: Option<Edge> = None;
        let mut tied: Vec<usize> = Vec::with_capacity(self.cursors.len());
        let mut iterations = 0usize;

        while let Some(Reverse(entry)) = heap.pop() {
            iterations += 1;
            if iterations % SHUTDOWN_CHECK_INTERVAL_RECORDS == 0 && self.shutdown_requested() {
                warn!("Merge interrupted after {} unique records", stats.unique_records);
                return Err(EdgeError::Interrupted);
            }

            // Every cursor holding the minimum advances this round
            tied.clear();
            tied.push(entry.cursor);
            while heap
                .peek()
                .map_or(false, |Reverse(next)| next.edge == entry.edge)
            {
                if let Some(Reverse(next)) = heap.pop() {
                    tied.push(next.cursor);
                }
            }
            stats.records_in += tied.len();
            stats.duplicates_removed += tied.len() - 1;

            if last_written.as_ref() != Some(&entry.edge) {
                write_edge(writer, &entry.edge)?;
                stats.unique_records += 1;
                last_written = Some(entry.edge);
            } else {
                stats.duplicates_removed += 1;
            }

            for &cursor in &tied {
                let reader = &mut self.cursors[cursor];
                reader.advance()?;
                if let Some(edge) = reader.peek_head() {
                    heap.push(Reverse(MergeEntry { edge: edge.clone(), cursor }));
                }
            }

            if iterations % PROGRESS_REPORT_INTERVAL_RECORDS == 0 {
                info!(
                    "Merge progress: {} unique, {} duplicates removed",
                    stats.unique_records, stats.duplicates_removed
                );
            }
        }

        writer.flush()?;

        stats.truncated_chunks = self.cursors.iter().filter(|c| c.was_truncated()).count();
        if stats.truncated_chunks > 0 {
            warn!("{} chunks were truncated by malformed lines", stats.truncated_chunks);
        }
        debug!(
            "Merged {} chunks: {} records in, {} unique",
            stats.chunks_merged, stats.records_in, stats.unique_records
        );
        Ok(stats)
    }

    /// Merges into `output` through a temp file that is renamed on success.
    pub fn merge_to_file(self, output: &Path, header: &str, buffer_size: usize) -> Result<MergeStats> {
        let mut file = AtomicFile::create(output, buffer_size)?;
        write_header(&mut file, header)?;
        let mut stats = self.merge_into(&mut file)?;
        stats.output_bytes = file.commit()?;

        info!(
            "Wrote {} unique records to {} ({} duplicates removed)",
            stats.unique_records,
            output.display(),
            stats.duplicates_removed
        );
        Ok(stats)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .map_or(false, |flag| flag.load(AtomicOrdering::Relaxed))
    }
}
