// src/table/mod.rs

pub mod decode;
pub mod parquet;
pub mod uniquify;

use arrow::{
    array::{ArrayRef, Float64Array},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::{collections::HashSet, sync::Arc};

use crate::error::ShapeError;

pub use decode::{decode, decode_document};
pub use uniquify::uniquify;

/// A row-major table of f64 cells with distinct column names.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TabularDataset {
    /// Build a dataset, checking row widths and name uniqueness.
    pub fn try_new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, ShapeError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ShapeError::DuplicateColumn(name.clone()));
            }
        }
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(ShapeError::RowWidth {
                row,
                found: values.len(),
                expected: columns.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset from column vectors of equal length.
    pub fn from_columns(columns: Vec<String>, values: Vec<Vec<f64>>) -> Result<Self, ShapeError> {
        let num_rows = values.first().map_or(0, Vec::len);
        if let Some((idx, col)) = values
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != num_rows)
        {
            return Err(ShapeError::RowWidth {
                row: idx,
                found: col.len(),
                expected: num_rows,
            });
        }
        let rows = (0..num_rows)
            .map(|r| values.iter().map(|col| col[r]).collect())
            .collect();
        Self::try_new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of column `idx`, top to bottom.
    pub fn column_values(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[idx]).collect()
    }

    /// Arrow schema: one nullable Float64 field per column.
    pub fn schema(&self) -> Arc<Schema> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = (0..self.num_columns())
            .map(|idx| Arc::new(Float64Array::from(self.column_values(idx))) as ArrayRef)
            .collect();
        RecordBatch::try_new(self.schema(), arrays)
    }
}
