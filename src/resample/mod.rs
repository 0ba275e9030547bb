// src/resample/mod.rs

pub mod grid;
pub mod interp;
pub mod locate;

use arrow::{
    array::{Array, AsArray},
    compute::cast,
    datatypes::{DataType, Float64Type},
    record_batch::RecordBatch,
};
use rayon::prelude::*;
use tracing::debug;

use crate::{config::PipelineConfig, error::ResampleError, table::TabularDataset};

pub use grid::TimeGrid;
pub use interp::Series;
pub use locate::{ColumnClassifier, NumericColumns, SubstringLocator, TimeColumnLocator};

/// Rows that survive time cleaning, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    /// Strictly increasing sample times.
    pub times: Vec<f64>,
    /// Source row of each entry in `times`.
    pub rows: Vec<usize>,
}

/// Drop missing/NaN times, sort ascending (stable) and keep the first row of
/// every repeated timestamp.
pub fn prepare_samples(time: &[Option<f64>]) -> Samples {
    let mut keyed: Vec<(usize, f64)> = time
        .iter()
        .enumerate()
        .filter_map(|(row, t)| t.filter(|t| !t.is_nan()).map(|t| (row, t)))
        .collect();
    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut samples = Samples {
        times: Vec::with_capacity(keyed.len()),
        rows: Vec::with_capacity(keyed.len()),
    };
    for (row, t) in keyed {
        if samples.times.last() == Some(&t) {
            continue;
        }
        samples.times.push(t);
        samples.rows.push(row);
    }
    samples
}

/// Cast any numeric (or numeric-looking text) column to f64. Nulls and
/// unparsable text come back as `None`.
fn column_as_f64(array: &dyn Array) -> Result<Vec<Option<f64>>, ResampleError> {
    let casted = cast(array, &DataType::Float64)?;
    Ok(casted.as_primitive::<Float64Type>().iter().collect())
}

/// Puts a table on a fixed-rate time grid.
pub struct Resampler {
    frequency_hz: f64,
    max_grid_points: usize,
    locator: Box<dyn TimeColumnLocator>,
    classifier: Box<dyn ColumnClassifier>,
}

impl Resampler {
    /// Grids beyond this many points are refused unless configured otherwise.
    pub const DEFAULT_MAX_GRID_POINTS: usize = 50_000_000;

    /// `frequency_hz` must be positive; the caller validates it.
    pub fn new(frequency_hz: f64, time_hint: &str) -> Self {
        Self {
            frequency_hz,
            max_grid_points: Self::DEFAULT_MAX_GRID_POINTS,
            locator: Box::new(SubstringLocator::new(time_hint)),
            classifier: Box::new(NumericColumns),
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(cfg.target_frequency_hz, &cfg.time_column_hint)
            .with_max_grid_points(cfg.max_grid_points)
    }

    pub fn with_max_grid_points(mut self, max_points: usize) -> Self {
        self.max_grid_points = max_points;
        self
    }

    pub fn with_locator(mut self, locator: impl TimeColumnLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn with_classifier(mut self, classifier: impl ColumnClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Resample every numeric column of `batch` onto a grid spanning its time
    /// column. The output starts with the time column; other columns keep
    /// their input order.
    pub fn resample(&self, batch: &RecordBatch) -> Result<TabularDataset, ResampleError> {
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let time_idx = self
            .locator
            .locate(&names)
            .ok_or_else(|| ResampleError::MissingTimeColumn {
                hint: self.locator.describe(),
            })?;

        let samples = prepare_samples(&column_as_f64(batch.column(time_idx).as_ref())?);
        let (t_min, t_max) = match (samples.times.first(), samples.times.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => (f64::NAN, f64::NAN),
        };
        let grid = TimeGrid::spanning(
            t_min,
            t_max,
            1.0 / self.frequency_hz,
            self.max_grid_points,
        )?;

        let mut out_names = vec![names[time_idx].to_string()];
        let mut inputs = Vec::new();
        let mut dropped = Vec::new();
        for (idx, field) in schema.fields().iter().enumerate() {
            if idx == time_idx {
                continue;
            }
            if !self.classifier.is_resamplable(field) {
                dropped.push(field.name().as_str());
                continue;
            }
            let all = column_as_f64(batch.column(idx).as_ref())?;
            let values: Vec<f64> = samples
                .rows
                .iter()
                .map(|&row| all[row].unwrap_or(f64::NAN))
                .collect();
            out_names.push(field.name().clone());
            inputs.push(values);
        }
        if !dropped.is_empty() {
            debug!(columns = ?dropped, "non-numeric columns left out of the resampled table");
        }

        let grid_times = grid.values();
        let mut columns: Vec<Vec<f64>> = inputs
            .par_iter()
            .map(|values| Series::from_samples(&samples.times, values).sample(&grid_times))
            .collect();
        columns.insert(0, grid_times);

        debug!(
            rows_in = batch.num_rows(),
            rows_clean = samples.times.len(),
            rows_out = grid.count,
            "resampled"
        );
        Ok(TabularDataset::from_columns(out_names, columns)?)
    }

    pub fn resample_dataset(&self, ds: &TabularDataset) -> Result<TabularDataset, ResampleError> {
        self.resample(&ds.to_record_batch()?)
    }
}
