use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::constants::ESTIMATED_EDGE_BYTES;
use crate::error::Result;
use crate::graph::adjacency::AdjacencySet;
use crate::graph::edge::Edge;
use crate::graph::entity::EntityId;

/// Destination for projected edges.
pub trait EdgeSink {
    fn accept(&mut self, edge: Edge) -> Result<()>;
}

impl EdgeSink for BTreeSet<Edge> {
    fn accept(&mut self, edge: Edge) -> Result<()> {
        self.insert(edge);
        Ok(())
    }
}

impl EdgeSink for HashSet<Edge> {
    fn accept(&mut self, edge: Edge) -> Result<()> {
        self.insert(edge);
        Ok(())
    }
}

impl EdgeSink for Vec<Edge> {
    fn accept(&mut self, edge: Edge) -> Result<()> {
        self.push(edge);
        Ok(())
    }
}

/// How a projection is materialized before it reaches disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Union every hub's pairs in memory; output is sorted and unique.
    Buffered,
    /// Write each hub's pairs as they are generated; cross-hub duplicates
    /// remain and must be removed by the external merge.
    Streaming,
    /// Buffered when the estimated pair set fits the memory budget.
    Auto,
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Auto
    }
}

impl ProjectionMode {
    pub fn resolve(self, adjacency: &AdjacencySet, memory_limit_bytes: usize) -> ProjectionMode {
        match self {
            ProjectionMode::Auto => {
                let estimated = adjacency
                    .estimated_pair_count()
                    .saturating_mul(ESTIMATED_EDGE_BYTES as u64);
                if estimated <= memory_limit_bytes as u64 {
                    ProjectionMode::Buffered
                } else {
                    ProjectionMode::Streaming
                }
            }
            mode => mode,
        }
    }
}

/// Lazy iterator over every unordered pair of one hub's neighbors.
pub struct HubPairs<'a> {
    members: Vec<&'a EntityId>,
    i: usize,
    j: usize,
}

impl<'a> HubPairs<'a> {
    pub fn new(neighbors: &'a BTreeSet<EntityId>) -> Self {
        Self {
            members: neighbors.iter().collect(),
            i: 0,
            j: 1,
        }
    }

    fn remaining(&self) -> usize {
        let n = self.members.len();
        if self.i + 1 >= n {
            return 0;
        }
        let current_row = n - self.j;
        let later_rows: usize = (self.i + 1..n).map(|row| n - row - 1).sum();
        current_row + later_rows
    }
}

impl<'a> Iterator for HubPairs<'a> {
    type Item = Edge;

    fn next(&mut self) -> Option<Edge> {
        let n = self.members.len();
        while self.i + 1 < n {
            if self.j >= n {
                self.i += 1;
                self.j = self.i + 1;
                continue;
            }
            // BTreeSet iteration is ascending, so members[i] < members[j]
            let edge = Edge::from_sorted(self.members[self.i].clone(), self.members[self.j].clone());
            self.j += 1;
            return Some(edge);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    pub hubs_seen: usize,
    pub hubs_projected: usize,
    pub large_hubs: usize,
    pub pairs_emitted: u64,
}

/// Connects every two neighbors that share a hub.
#[derive(Debug, Clone)]
pub struct PairProjector {
    large_hub_threshold: usize,
}

impl PairProjector {
    pub fn new(large_hub_threshold: usize) -> Self {
        Self { large_hub_threshold }
    }

    pub fn hub_pairs(neighbors: &BTreeSet<EntityId>) -> HubPairs<'_> {
        HubPairs::new(neighbors)
    }

    /// Full deduplicated projection held in memory.
    pub fn project(&self, adjacency: &AdjacencySet) -> BTreeSet<Edge> {
        let mut edges = BTreeSet::new();
        for (_, neighbors) in adjacency.hubs() {
            edges.extend(HubPairs::new(neighbors));
        }
        edges
    }

    /// Same result as `project`, with hubs spread across rayon workers.
    pub fn project_parallel(&self, adjacency: &AdjacencySet) -> BTreeSet<Edge> {
        let hubs: Vec<&BTreeSet<EntityId>> = adjacency.hubs().map(|(_, n)| n).collect();
        hubs.par_iter()
            .fold(BTreeSet::new, |mut acc, neighbors| {
                acc.extend(HubPairs::new(neighbors));
                acc
            })
            .reduce(BTreeSet::new, |mut a, mut b| {
                if a.len() < b.len() {
                    std::mem::swap(&mut a, &mut b);
                }
                a.extend(b);
                a
            })
    }

    /// Logs every hub whose degree exceeds the threshold and returns the count.
    pub fn report_large_hubs(&self, adjacency: &AdjacencySet) -> usize {
        adjacency
            .hubs()
            .filter(|(hub, neighbors)| self.warn_if_large(hub, neighbors))
            .count()
    }

    fn warn_if_large(&self, hub: &EntityId, neighbors: &BTreeSet<EntityId>) -> bool {
        let degree = neighbors.len();
        if degree <= self.large_hub_threshold {
            return false;
        }
        warn!(
            "Hub {} has {} neighbors; projecting {} pairs",
            hub,
            degree,
            HubPairs::new(neighbors).size_hint().0
        );
        true
    }

    /// Streams each hub's pairs into `sink` without buffering the union.
    pub fn project_into<S: EdgeSink>(&self, adjacency: &AdjacencySet, sink: &mut S) -> Result<ProjectionStats> {
        let mut stats = ProjectionStats::default();

        for (hub, neighbors) in adjacency.hubs() {
            stats.hubs_seen += 1;
            let degree = neighbors.len();
            if degree < 2 {
                continue;
            }

            if self.warn_if_large(hub, neighbors) {
                stats.large_hubs += 1;
            }

            for edge in HubPairs::new(neighbors) {
                sink.accept(edge)?;
                stats.pairs_emitted += 1;
            }
            stats.hubs_projected += 1;
        }

        debug!(
            "Projected {} of {} hubs into {} pairs",
            stats.hubs_projected, stats.hubs_seen, stats.pairs_emitted
        );
        Ok(stats)
    }
}
