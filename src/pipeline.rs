use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::EdgeError;
use crate::external_sort::{DedupStats, EdgeDedupProcessor, PartitionStrategy};
use crate::graph::{write_projection, AdjacencySet, BipartiteGraph, PairProjector, ProjectionMode, ProjectionStats};
use crate::utils::format_duration;
use crate::utils::io::remove_if_exists;

pub const DOCTOR_PROJECTION_NAME: &str = "doctor_doctor";
pub const COMPANY_PROJECTION_NAME: &str = "company_company";

#[derive(Debug, Clone)]
pub struct SideStats {
    pub output: PathBuf,
    pub mode: ProjectionMode,
    pub projection: ProjectionStats,
    /// `None` when the projection was already sorted and unique.
    pub dedup: Option<DedupStats>,
}

#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub payments: usize,
    pub bad_lines: usize,
    pub doctors: usize,
    pub companies: usize,
    pub doctor_doctor: SideStats,
    pub company_company: SideStats,
    pub processing_time_seconds: f64,
}

/// Payment file in, two deduplicated co-occurrence edge lists out.
#[derive(Clone)]
pub struct CoPaymentPipeline {
    config: Config,
    projector: PairProjector,
    shutdown_flag: Arc<AtomicBool>,
}

impl CoPaymentPipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let projector = PairProjector::new(config.projection.large_hub_threshold);
        Ok(Self {
            config,
            projector,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = shutdown_flag;
        self
    }

    pub async fn run(&self, input: &Path, output_dir: &Path) -> Result<PipelineStats> {
        let pipeline = self.clone();
        let input = input.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        tokio::task::spawn_blocking(move || pipeline.run_blocking(&input, &output_dir)).await?
    }

    pub fn run_blocking(&self, input: &Path, output_dir: &Path) -> Result<PipelineStats> {
        let start = Instant::now();
        fs::create_dir_all(output_dir)?;

        let graph = BipartiteGraph::load(input, self.config.external_sort.io_buffer_size_bytes())?;
        if !graph.bad_lines.is_empty() {
            warn!("Skipped {} malformed payment lines", graph.bad_lines.len());
        }

        let doctor_doctor = self.project_side(
            &graph.company_to_doctors,
            output_dir,
            DOCTOR_PROJECTION_NAME,
            &self.config.projection.doctor_header,
        )?;
        let company_company = self.project_side(
            &graph.doctor_to_companies,
            output_dir,
            COMPANY_PROJECTION_NAME,
            &self.config.projection.company_header,
        )?;

        let stats = PipelineStats {
            payments: graph.payments,
            bad_lines: graph.bad_lines.len(),
            doctors: graph.doctor_to_companies.len(),
            companies: graph.company_to_doctors.len(),
            doctor_doctor,
            company_company,
            processing_time_seconds: start.elapsed().as_secs_f64(),
        };
        info!("Projection pipeline finished in {}", format_duration(stats.processing_time_seconds));
        Ok(stats)
    }

    fn project_side(
        &self,
        adjacency: &AdjacencySet,
        output_dir: &Path,
        name: &str,
        header: &str,
    ) -> Result<SideStats> {
        if self.shutdown_flag.load(Ordering::Relaxed) {
            return Err(EdgeError::Interrupted.into());
        }

        let sort_config = &self.config.external_sort;
        let mode = self
            .config
            .projection
            .mode
            .resolve(adjacency, sort_config.memory_limit_bytes());
        info!(
            "Projecting {}: {} hubs, max degree {}, ~{} pairs, {:?} mode",
            name,
            adjacency.len(),
            adjacency.max_degree(),
            adjacency.estimated_pair_count(),
            mode
        );

        let output = output_dir.join(format!("{}.tab", name));
        let raw = output_dir.join(format!("{}_raw.tab", name));
        let projection = write_projection(
            &self.projector,
            adjacency,
            &raw,
            header,
            mode,
            sort_config.io_buffer_size_bytes(),
        )?;

        // Buffered output is already sorted and unique
        if mode == ProjectionMode::Buffered || projection.pairs_emitted == 0 {
            fs::rename(&raw, &output)?;
            return Ok(SideStats {
                output,
                mode,
                projection,
                dedup: None,
            });
        }

        // Every raw line is a valid pair, so LineCount with N <= lines yields exactly N chunks
        let mut dedup_config = sort_config.clone();
        dedup_config.chunk_header = header.to_string();
        dedup_config.temp_directory = sort_config.temp_directory.join(name);
        dedup_config.strategy = PartitionStrategy::LineCount;
        dedup_config.partitions = dedup_config
            .partitions
            .min(projection.pairs_emitted.min(usize::MAX as u64) as usize);

        let deduped = EdgeDedupProcessor::new(dedup_config).and_then(|processor| {
            Ok(processor
                .with_shutdown_signal(self.shutdown_flag.clone())
                .process(&raw, &output)?)
        });
        let dedup = match deduped {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(cleanup) = remove_if_exists(&raw) {
                    warn!("Failed to remove {}: {}", raw.display(), cleanup);
                }
                return Err(e);
            }
        };
        if !sort_config.keep_chunks {
            remove_if_exists(&raw)?;
        }

        Ok(SideStats {
            output,
            mode,
            projection,
            dedup: Some(dedup),
        })
    }
}
