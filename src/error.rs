use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by projection, partitioning and merging.
///
/// `Format` and `SelfLoop` are line-local and are skipped by the
/// partitioner; the structural variants stop the pipeline.
#[derive(Error, Debug)]
pub enum EdgeError {
    #[error("Invalid edge record at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("Self-referential edge on entity {entity}")]
    SelfLoop { entity: String },

    #[error("Chunk {} has no records and cannot seed a merge cursor", chunk.display())]
    DegenerateChunk { chunk: PathBuf },

    #[error("Partitioner produced {produced} non-empty chunks, expected {requested}")]
    PartitionCountMismatch { requested: usize, produced: usize },

    #[error("Merge requires at least one chunk")]
    NoChunks,

    #[error("Processing interrupted by shutdown signal")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EdgeError>;

impl EdgeError {
    pub fn format(line: usize, reason: impl Into<String>) -> Self {
        EdgeError::Format {
            line,
            reason: reason.into(),
        }
    }

    /// True for errors that only invalidate a single input line.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EdgeError::Format { .. } | EdgeError::SelfLoop { .. })
    }
}
