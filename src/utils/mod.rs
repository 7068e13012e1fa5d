pub mod io;
pub mod system;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Maps a configured verbosity name to the coedge log level.
pub fn verbosity_level(verbosity: &str) -> Level {
    match verbosity {
        "silent" => Level::ERROR,
        "verbose" => Level::DEBUG,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber. `RUST_LOG` still governs other crates.
pub fn setup_logging(verbosity: &str) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("coedge={}", verbosity_level(verbosity)).parse()?);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Edge and record counts, e.g. `1.50M` pairs. Below a thousand the count is exact.
pub fn format_count(count: u64) -> String {
    const SUFFIXES: &[(u64, &str)] = &[(1_000_000_000, "G"), (1_000_000, "M"), (1_000, "K")];
    SUFFIXES
        .iter()
        .find(|(scale, _)| count >= *scale)
        .map(|(scale, suffix)| format!("{:.2}{}", count as f64 / *scale as f64, suffix))
        .unwrap_or_else(|| count.to_string())
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

pub fn format_duration(seconds: f64) -> String {
    match seconds {
        s if s < 1.0 => format!("{:.0}ms", s * 1000.0),
        s if s < 60.0 => format!("{:.1}s", s),
        s if s < 3600.0 => format!("{:.1}m", s / 60.0),
        s => format!("{:.1}h", s / 3600.0),
    }
}
