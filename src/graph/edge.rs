use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::FIELD_SEPARATOR;
use crate::error::{EdgeError, Result};
use crate::graph::entity::EntityId;

/// Unordered pair of distinct entities, stored smaller-first.
///
/// The derived ordering compares `low` then `high`, which is the canonical
/// pair ordering used for chunk sorting and merge dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    low: EntityId,
    high: EntityId,
}

impl Edge {
    pub fn new(a: EntityId, b: EntityId) -> Result<Self> {
        if a == b {
            return Err(EdgeError::SelfLoop { entity: a.to_string() });
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Caller guarantees `low < high`.
    pub(crate) fn from_sorted(low: EntityId, high: EntityId) -> Self {
        debug_assert!(low < high);
        Self { low, high }
    }

    pub fn from_tokens(a: &str, b: &str) -> Result<Self> {
        Self::new(EntityId::parse(a), EntityId::parse(b))
    }

    pub fn low(&self) -> &EntityId {
        &self.low
    }

    pub fn high(&self) -> &EntityId {
        &self.high
    }

    pub fn into_parts(self) -> (EntityId, EntityId) {
        (self.low, self.high)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, FIELD_SEPARATOR, self.high)
    }
}
