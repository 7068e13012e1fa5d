use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opaque node identifier read from an edge or payment file.
///
/// Tokens that are the canonical decimal form of an integer are kept as
/// `Numeric` so they order numerically; anything else (including `"007"`)
/// stays `Text`. Every numeric id orders before every textual id, which
/// keeps the ordering total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Numeric(i64),
    Text(String),
}

impl EntityId {
    pub fn parse(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(value) if value.to_string() == token => EntityId::Numeric(value),
            _ => EntityId::Text(token.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, EntityId::Numeric(_))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Numeric(value)
    }
}

impl From<&str> for EntityId {
    fn from(token: &str) -> Self {
        EntityId::parse(token)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Numeric(value) => write!(f, "{}", value),
            EntityId::Text(text) => f.write_str(text),
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (EntityId::Numeric(a), EntityId::Numeric(b)) => a.cmp(b),
            (EntityId::Numeric(_), EntityId::Text(_)) => Ordering::Less,
            (EntityId::Text(_), EntityId::Numeric(_)) => Ordering::Greater,
            (EntityId::Text(a), EntityId::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
        }
    }
}
