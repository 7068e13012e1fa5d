use std::collections::{BTreeSet, HashMap};

use crate::graph::entity::EntityId;

/// Hub -> neighbor set mapping (company -> doctors paid, or doctor ->
/// companies paying). Repeated neighbors collapse. A hub with no
/// neighbors is never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencySet {
    hubs: HashMap<EntityId, BTreeSet<EntityId>>,
}

impl AdjacencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the neighbor was already listed for this hub.
    pub fn insert(&mut self, hub: EntityId, neighbor: EntityId) -> bool {
        self.hubs.entry(hub).or_default().insert(neighbor)
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn contains_hub(&self, hub: &EntityId) -> bool {
        self.hubs.contains_key(hub)
    }

    pub fn neighbors(&self, hub: &EntityId) -> Option<&BTreeSet<EntityId>> {
        self.hubs.get(hub)
    }

    pub fn degree(&self, hub: &EntityId) -> usize {
        self.hubs.get(hub).map_or(0, |n| n.len())
    }

    pub fn hubs(&self) -> impl Iterator<Item = (&EntityId, &BTreeSet<EntityId>)> {
        self.hubs.iter()
    }

    /// Number of pairs a full projection would emit before cross-hub dedup.
    pub fn estimated_pair_count(&self) -> u64 {
        self.hubs
            .values()
            .map(|n| {
                let k = n.len() as u64;
                k * k.saturating_sub(1) / 2
            })
            .sum()
    }

    pub fn max_degree(&self) -> usize {
        self.hubs.values().map(|n| n.len()).max().unwrap_or(0)
    }
}

impl FromIterator<(EntityId, EntityId)> for AdjacencySet {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityId)>>(iter: I) -> Self {
        let mut set = AdjacencySet::new();
        for (hub, neighbor) in iter {
            set.insert(hub, neighbor);
        }
        set
    }
}
