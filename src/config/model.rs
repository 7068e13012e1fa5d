use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPANY_HEADER, DEFAULT_DOCTOR_HEADER, DEFAULT_LARGE_HUB_THRESHOLD};
use crate::external_sort::ExternalSortConfig;
use crate::graph::ProjectionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub external_sort: ExternalSortConfig,
    pub projection: ProjectionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub mode: ProjectionMode,
    /// Hubs above this degree are logged before their pairs are emitted.
    pub large_hub_threshold: usize,
    pub doctor_header: String,
    pub company_header: String,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::default(),
            large_hub_threshold: DEFAULT_LARGE_HUB_THRESHOLD,
            doctor_header: DEFAULT_DOCTOR_HEADER.to_string(),
            company_header: DEFAULT_COMPANY_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `silent`, `normal`, `verbose`.
    pub verbosity: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: "normal".to_string(),
        }
    }
}
