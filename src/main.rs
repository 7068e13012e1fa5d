use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use coedge::config::Config;
use coedge::external_sort::{merge_chunk_files, sort_and_deduplicate_with_shutdown, DedupStats, PartitionStrategy};
use coedge::pipeline::{CoPaymentPipeline, SideStats};
use coedge::utils::system::get_memory_info;
use coedge::utils::{format_bytes, format_count, format_duration, setup_logging};

#[derive(Parser)]
#[command(name = "coedge")]
#[command(about = "Projects payment graphs into co-occurrence edge lists and deduplicates them out of core")]
#[command(version)]
struct Args {
    #[arg(short, long, default_value = "coedge.json", help = "Configuration file path")]
    config: PathBuf,

    #[arg(short, long, global = true, help = "Verbose output")]
    verbose: bool,

    #[arg(long, global = true, help = "Number of partitions for the external sort")]
    partitions: Option<usize>,

    #[arg(long, global = true, value_enum, help = "How partition boundaries are chosen")]
    strategy: Option<StrategyArg>,

    #[arg(long, global = true, help = "Keep chunk files after merging")]
    keep_chunks: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deduplicate one edge list file
    Dedup {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Merge chunk files from an earlier run
    Merge {
        #[arg(short, long, num_args = 1.., required = true)]
        chunks: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Project a payment file into doctor and company edge lists
    Project {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    ByteOffset,
    LineCount,
}

impl From<StrategyArg> for PartitionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ByteOffset => PartitionStrategy::ByteOffset,
            StrategyArg::LineCount => PartitionStrategy::LineCount,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_create(&args.config).await?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let verbosity = if args.verbose { "verbose" } else { config.logging.verbosity.as_str() };
    setup_logging(verbosity)?;

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, stopping");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    let (total_gb, available_gb) = get_memory_info();
    info!(
        "Memory: {:.1} GB total, {:.1} GB available, {:.0}% usable",
        total_gb, available_gb, config.external_sort.memory_usage_percent
    );

    let start_time = Instant::now();

    match args.command {
        Command::Dedup { input, output } => {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {}", input.display());
            }
            info!("Input: {} ({})", input.display(), format_bytes(std::fs::metadata(&input)?.len()));
            let stats =
                sort_and_deduplicate_with_shutdown(&input, &output, config.external_sort, shutdown_flag).await?;
            report_dedup("dedup", &stats);
        }
        Command::Merge { chunks, output } => {
            let stats = merge_chunk_files(chunks, &output, config.external_sort, shutdown_flag).await?;
            report_dedup("merge", &stats);
        }
        Command::Project { input, output_dir } => {
            if !input.exists() {
                anyhow::bail!("Payment file does not exist: {}", input.display());
            }
            let stats = CoPaymentPipeline::new(config)?
                .with_shutdown_signal(shutdown_flag)
                .run(&input, &output_dir)
                .await?;

            info!(
                "Payments: {} ({} bad lines), {} doctors, {} companies",
                stats.payments, stats.bad_lines, stats.doctors, stats.companies
            );
            report_side(&stats.doctor_doctor);
            report_side(&stats.company_company);
        }
    }

    info!("Total time: {}", format_duration(start_time.elapsed().as_secs_f64()));
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(partitions) = args.partitions {
        config.external_sort.partitions = partitions;
    }
    if let Some(strategy) = args.strategy {
        config.external_sort.strategy = strategy.into();
    }
    if args.keep_chunks {
        config.external_sort.keep_chunks = true;
    }
    if args.verbose {
        config.external_sort.verbose = true;
    }
}

fn report_dedup(label: &str, stats: &DedupStats) {
    info!(
        "{}: {} lines read, {} malformed, {} self-loops",
        label, stats.lines_read, stats.malformed_lines, stats.self_loops
    );
    info!(
        "{}: {} chunks, {} unique edges, {} duplicates removed, {} written",
        label,
        stats.chunks_created,
        format_count(stats.unique_records as u64),
        format_count(stats.duplicates_removed as u64),
        format_bytes(stats.output_bytes)
    );
    if stats.truncated_chunks > 0 {
        warn!("{}: {} chunks were cut short by bad lines", label, stats.truncated_chunks);
    }
}

fn report_side(side: &SideStats) {
    info!(
        "{}: {} pairs from {} hubs ({:?})",
        side.output.display(),
        format_count(side.projection.pairs_emitted),
        side.projection.hubs_projected,
        side.mode
    );
    if let Some(dedup) = &side.dedup {
        report_dedup(&side.output.display().to_string(), dedup);
    }
}
