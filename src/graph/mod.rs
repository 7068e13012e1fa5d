pub mod adjacency;
pub mod bipartite;
pub mod edge;
pub mod entity;
pub mod projector;
pub mod writer;

pub use adjacency::AdjacencySet;
pub use bipartite::BipartiteGraph;
pub use edge::Edge;
pub use entity::EntityId;
pub use projector::{EdgeSink, HubPairs, PairProjector, ProjectionMode, ProjectionStats};
pub use writer::{write_projection, ProjectionWriter};
