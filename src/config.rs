// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::resample::Resampler;

/// Every knob the three stages read. Defaults reproduce the usual layout of a
/// simulation run folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Resampling rate in Hz; the grid step is `1 / target_frequency_hz`.
    pub target_frequency_hz: f64,
    /// Case-insensitive substring that identifies the time column.
    pub time_column_hint: String,
    /// Abort a batch at the first file that does not convert.
    pub stop_on_error: bool,
    pub max_workers: usize,
    /// Per-file compute budget in seconds. 0 disables the timeout.
    pub file_timeout_secs: u64,
    /// Largest time grid a single file may resample onto.
    pub max_grid_points: usize,
    pub dirs: Dirs,
    pub mapping: MappingSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Dirs {
    pub raw: PathBuf,
    pub renamed: PathBuf,
    pub parquet: PathBuf,
    pub resampled: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MappingSource {
    pub path: PathBuf,
    pub original_column: String,
    pub replacement_column: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_frequency_hz: 120.0,
            time_column_hint: "tempo".to_string(),
            stop_on_error: false,
            max_workers: num_cpus::get().max(1),
            file_timeout_secs: 300,
            max_grid_points: Resampler::DEFAULT_MAX_GRID_POINTS,
            dirs: Dirs::default(),
            mapping: MappingSource::default(),
        }
    }
}

impl Default for Dirs {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("data_raw"),
            renamed: PathBuf::from("data_renamed"),
            parquet: PathBuf::from("data_parquet"),
            resampled: PathBuf::from("data_parquet_120Hz"),
        }
    }
}

impl Default for MappingSource {
    fn default() -> Self {
        Self {
            path: PathBuf::from("header_mapping.csv"),
            original_column: "Nome Atual".to_string(),
            replacement_column: "Nome Atualizado".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML config; keys that are absent keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_frequency_hz.is_finite() || self.target_frequency_hz <= 0.0 {
            bail!(
                "target_frequency_hz must be a positive number, got {}",
                self.target_frequency_hz
            );
        }
        if self.time_column_hint.trim().is_empty() {
            bail!("time_column_hint must not be empty");
        }
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.max_grid_points == 0 {
            bail!("max_grid_points must be at least 1");
        }
        Ok(())
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_secs > 0).then(|| Duration::from_secs(self.file_timeout_secs))
    }
}
