// src/table/parquet.rs

use anyhow::{Context, Result};
use arrow::{compute::concat_batches, record_batch::RecordBatch};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{fs::File, path::Path};
use tracing::debug;

use super::TabularDataset;
use crate::atomic::write_atomic;

fn writer_properties() -> Result<WriterProperties> {
    Ok(WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build())
}

/// Write `batch` to `out_path` through a temporary sibling file, so a reader
/// never sees a half-written table. Returns the size on disk.
pub fn write_batch(batch: &RecordBatch, out_path: &Path) -> Result<u64> {
    let props = writer_properties()?;
    let bytes = write_atomic(out_path, |file| {
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .context("creating parquet writer")?;
        writer.write(batch).context("writing batch to parquet")?;
        writer.close().context("closing parquet writer")?;
        Ok(())
    })?;
    debug!(path = %out_path.display(), rows = batch.num_rows(), bytes, "wrote parquet");
    Ok(bytes)
}

pub fn write_dataset(ds: &TabularDataset, out_path: &Path) -> Result<u64> {
    write_batch(&ds.to_record_batch()?, out_path)
}

/// Read every row group of a Parquet file into a single batch.
pub fn read_batch(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let batches = reader
        .collect::<Result<Vec<RecordBatch>, _>>()
        .with_context(|| format!("decoding {}", path.display()))?;
    concat_batches(&schema, &batches).context("concatenating row groups")
}
