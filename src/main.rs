use anyhow::Result;
use clap::{Parser, Subcommand};
use pltpipe::{
    batch::{self, BatchSummary},
    config::PipelineConfig,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert simulation .plt dumps into fixed-rate Parquet tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// YAML config; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resampling rate in Hz
    #[arg(long, global = true)]
    frequency: Option<f64>,

    /// Case-insensitive substring identifying the time column
    #[arg(long, global = true)]
    time_hint: Option<String>,

    /// Abort a stage at the first file that does not convert
    #[arg(long, global = true)]
    stop_on_error: bool,

    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Per-file budget in seconds, 0 disables it
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Largest time grid one file may be resampled onto
    #[arg(long, global = true)]
    max_grid_points: Option<usize>,

    /// Write a JSON summary of every stage that ran
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    renamed_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    parquet_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    resampled_dir: Option<PathBuf>,

    /// CSV with the original and updated variable names
    #[arg(long, global = true)]
    mapping: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite record headers through the name mapping
    Rename,
    /// Turn renamed records into Parquet tables
    Decode,
    /// Resample Parquet tables onto a fixed-rate grid
    Resample,
    /// rename, decode and resample in sequence
    Run,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(hz) = self.frequency {
            cfg.target_frequency_hz = hz;
        }
        if let Some(hint) = &self.time_hint {
            cfg.time_column_hint = hint.clone();
        }
        if self.stop_on_error {
            cfg.stop_on_error = true;
        }
        if let Some(n) = self.workers {
            cfg.max_workers = n;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.file_timeout_secs = secs;
        }
        if let Some(points) = self.max_grid_points {
            cfg.max_grid_points = points;
        }
        if let Some(dir) = &self.raw_dir {
            cfg.dirs.raw = dir.clone();
        }
        if let Some(dir) = &self.renamed_dir {
            cfg.dirs.renamed = dir.clone();
        }
        if let Some(dir) = &self.parquet_dir {
            cfg.dirs.parquet = dir.clone();
        }
        if let Some(dir) = &self.resampled_dir {
            cfg.dirs.resampled = dir.clone();
        }
        if let Some(path) = &self.mapping {
            cfg.mapping.path = path.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = cli.pipeline_config()?;
    info!(
        hz = cfg.target_frequency_hz,
        workers = cfg.max_workers,
        "startup"
    );

    // ─── 3) run the requested stages ─────────────────────────────────
    let result: Result<Vec<BatchSummary>> = match cli.command {
        Command::Rename => batch::rename_batch(&cfg).await.map(|s| vec![s]),
        Command::Decode => batch::decode_batch(&cfg).await.map(|s| vec![s]),
        Command::Resample => batch::resample_batch(&cfg).await.map(|s| vec![s]),
        Command::Run => batch::run_pipeline(&cfg).await,
    };
    let summaries = match result {
        Ok(summaries) => summaries,
        Err(err) => {
            error!("{:#}", err);
            return Err(err);
        }
    };

    if let Some(path) = &cli.report {
        batch::write_report(path, &summaries)?;
        info!("report → {}", path.display());
    }

    info!("all done");
    Ok(())
}
