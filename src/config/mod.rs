pub mod model;


use anyhow::{bail, Result};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub use self::model::{Config, LoggingConfig, ProjectionConfig};

const VERBOSITY_LEVELS: &[&str] = &["silent", "normal", "verbose"];

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or writes the defaults there when it does not exist.
    pub async fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await? {
            return Self::load(path).await;
        }

        info!("Config file not found, creating default: {}", path.display());
        let config = Config::default();
        config.save(path).await?;
        Ok(config)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.external_sort.validate()?;

        if self.projection.large_hub_threshold < 2 {
            bail!("Large hub threshold must be at least 2");
        }
        for header in [&self.projection.doctor_header, &self.projection.company_header] {
            if header.contains('\n') {
                bail!("Projection headers must be a single line");
            }
        }
        if !VERBOSITY_LEVELS.contains(&self.logging.verbosity.as_str()) {
            bail!(
                "Unknown verbosity '{}', expected one of {:?}",
                self.logging.verbosity,
                VERBOSITY_LEVELS
            );
        }
        Ok(())
    }
}
