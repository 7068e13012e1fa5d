// External sort: partition, k-way merge, dedup
pub mod external_sort;

// Bipartite graph loading and pair projection
pub mod graph;

pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;
pub mod utils;

// Re-export main types for convenience
pub use config::Config;
pub use error::{EdgeError, Result};
pub use external_sort::{DedupStats, EdgeDedupProcessor, ExternalSortConfig, PartitionStrategy};
pub use graph::{AdjacencySet, BipartiteGraph, Edge, EntityId, PairProjector, ProjectionMode};
pub use pipeline::{CoPaymentPipeline, PipelineStats};
