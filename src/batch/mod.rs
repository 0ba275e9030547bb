// src/batch/mod.rs

pub mod stages;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    task::JoinSet,
    time::Instant,
};
use tracing::{error, info, warn};

use crate::{
    atomic::write_atomic,
    config::PipelineConfig,
    error::{is_skippable, BatchError},
    mapping::NameMapping,
    resample::Resampler,
};

pub use stages::{Artifact, DecodeStage, RenameStage, ResampleStage, Stage};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Converted {
        output: PathBuf,
        rows: usize,
        columns: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileOutcome {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self.status, FileStatus::Converted { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub stage: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Sorted by file name.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    fn new(stage: &str, input_dir: &Path, output_dir: &Path, started_at: DateTime<Utc>) -> Self {
        Self {
            stage: stage.to_string(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            started_at,
            finished_at: started_at,
            converted: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome.status {
            FileStatus::Converted { .. } => self.converted += 1,
            FileStatus::Skipped { .. } => self.skipped += 1,
            FileStatus::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn all_converted(&self) -> bool {
        self.skipped == 0 && self.failed == 0
    }
}

/// Input files the stage accepts, sorted by name.
fn discover_inputs(stage: &dyn Stage, input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(input_dir)
        .with_context(|| format!("listing {}", input_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && stage.accepts(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Compute under the time budget, then persist. Nothing is written unless
/// compute finished in time and succeeded.
///
/// `permit` travels with the blocking work: a computation that outlives its
/// timeout keeps its worker slot until it actually returns.
async fn convert_file(
    stage: Arc<dyn Stage>,
    input: PathBuf,
    output_dir: PathBuf,
    timeout: Option<Duration>,
    permit: OwnedSemaphorePermit,
) -> Result<FileStatus> {
    let dest = output_dir.join(stage.output_name(&input)?);

    let compute = tokio::task::spawn_blocking({
        let stage = Arc::clone(&stage);
        move || (stage.compute(&input), permit)
    });
    let (artifact, permit) = match timeout {
        Some(limit) => tokio::time::timeout(limit, compute)
            .await
            .map_err(|_| BatchError::Timeout(limit))??,
        None => compute.await?,
    };
    let artifact = artifact?;

    let (rows, columns) = artifact.shape();
    let written = dest.clone();
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        artifact.persist(&written)
    })
    .await??;

    Ok(FileStatus::Converted {
        output: dest,
        rows,
        columns,
    })
}

#[tracing::instrument(level = "info", skip_all, fields(stage = stage.name(), file = %file))]
async fn run_one(
    stage: Arc<dyn Stage>,
    input: PathBuf,
    file: String,
    output_dir: PathBuf,
    timeout: Option<Duration>,
    permits: Arc<Semaphore>,
) -> FileOutcome {
    let start = Instant::now();
    let status = match permits.acquire_owned().await {
        Ok(permit) => match convert_file(stage, input, output_dir, timeout, permit).await {
            Ok(status) => {
                info!(elapsed = ?start.elapsed(), "converted");
                status
            }
            Err(err) if is_skippable(&err) => {
                warn!("skipped: {:#}", err);
                FileStatus::Skipped {
                    reason: format!("{:#}", err),
                }
            }
            Err(err) => {
                error!("failed: {:#}", err);
                FileStatus::Failed {
                    reason: format!("{:#}", err),
                }
            }
        },
        Err(err) => FileStatus::Failed {
            reason: format!("worker pool closed: {}", err),
        },
    };
    FileOutcome { file, status }
}

/// Run `stage` over every accepted file in `input_dir`, writing into
/// `output_dir`. Per-file problems are recorded in the summary; with
/// `stop_on_error` the first one aborts the batch instead.
pub async fn run_batch(
    stage: Arc<dyn Stage>,
    input_dir: &Path,
    output_dir: &Path,
    cfg: &PipelineConfig,
) -> Result<BatchSummary> {
    if !input_dir.is_dir() {
        return Err(BatchError::MissingInputDir(input_dir.display().to_string()).into());
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let mut summary = BatchSummary::new(stage.name(), input_dir, output_dir, Utc::now());
    let inputs = discover_inputs(stage.as_ref(), input_dir)?;
    info!(
        stage = stage.name(),
        "{} files in {}",
        inputs.len(),
        input_dir.display()
    );

    let permits = Arc::new(Semaphore::new(cfg.max_workers.max(1)));
    let mut tasks = JoinSet::new();
    for input in inputs {
        let file = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        tasks.spawn(run_one(
            Arc::clone(&stage),
            input,
            file,
            output_dir.to_path_buf(),
            cfg.file_timeout(),
            Arc::clone(&permits),
        ));
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.context("file task panicked")?;
        if cfg.stop_on_error && !outcome.is_converted() {
            tasks.abort_all();
            let reason = match &outcome.status {
                FileStatus::Skipped { reason } | FileStatus::Failed { reason } => reason.clone(),
                FileStatus::Converted { .. } => String::new(),
            };
            error!(stage = stage.name(), file = %outcome.file, "stopping batch");
            return Err(BatchError::Stopped {
                stage: stage.name().to_string(),
                file: outcome.file,
                reason,
            }
            .into());
        }
        summary.record(outcome);
    }

    summary.outcomes.sort_by(|a, b| a.file.cmp(&b.file));
    summary.finished_at = Utc::now();
    info!(
        stage = %summary.stage,
        converted = summary.converted,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch complete → {}",
        output_dir.display()
    );
    Ok(summary)
}

pub async fn rename_batch(cfg: &PipelineConfig) -> Result<BatchSummary> {
    // an unreadable mapping is fatal for the whole batch
    let mapping = NameMapping::from_csv(
        &cfg.mapping.path,
        &cfg.mapping.original_column,
        &cfg.mapping.replacement_column,
    )?;
    let stage: Arc<dyn Stage> = Arc::new(RenameStage::new(Arc::new(mapping)));
    run_batch(stage, &cfg.dirs.raw, &cfg.dirs.renamed, cfg).await
}

pub async fn decode_batch(cfg: &PipelineConfig) -> Result<BatchSummary> {
    let stage: Arc<dyn Stage> = Arc::new(DecodeStage);
    run_batch(stage, &cfg.dirs.renamed, &cfg.dirs.parquet, cfg).await
}

pub async fn resample_batch(cfg: &PipelineConfig) -> Result<BatchSummary> {
    let stage: Arc<dyn Stage> = Arc::new(ResampleStage::new(Resampler::from_config(cfg)));
    run_batch(stage, &cfg.dirs.parquet, &cfg.dirs.resampled, cfg).await
}

/// rename → decode → resample. Each stage reads the previous stage's output
/// directory.
pub async fn run_pipeline(cfg: &PipelineConfig) -> Result<Vec<BatchSummary>> {
    let mut summaries = Vec::with_capacity(3);
    summaries.push(rename_batch(cfg).await?);
    summaries.push(decode_batch(cfg).await?);
    summaries.push(resample_batch(cfg).await?);

    if summaries.iter().all(BatchSummary::all_converted) {
        info!("pipeline completed successfully");
    } else {
        warn!("pipeline completed with skipped or failed files");
    }
    Ok(summaries)
}

/// Write the summaries as pretty JSON, atomically.
pub fn write_report(path: &Path, summaries: &[BatchSummary]) -> Result<()> {
    write_atomic(path, |file| {
        serde_json::to_writer_pretty(&mut *file, summaries).context("serializing report")?;
        file.write_all(b"\n")?;
        Ok(())
    })?;
    Ok(())
}
