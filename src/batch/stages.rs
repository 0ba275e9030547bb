// src/batch/stages.rs

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use crate::{
    atomic::write_atomic,
    mapping::NameMapping,
    record::{self, rename::rename_document},
    resample::Resampler,
    table::{decode_document, parquet, TabularDataset},
};

/// One directory-to-directory step of the pipeline.
///
/// `compute` does all the work in memory and must not touch the output
/// directory; the batch runner persists the artifact only once compute has
/// finished inside its time budget.
pub trait Stage: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Whether a file in the input directory belongs to this stage.
    fn accepts(&self, path: &Path) -> bool;

    /// Output file name for `input`, relative to the output directory.
    fn output_name(&self, input: &Path) -> Result<PathBuf>;

    fn compute(&self, input: &Path) -> Result<Artifact>;
}

/// A fully computed per-file result, ready to be written.
#[derive(Debug)]
pub enum Artifact {
    Record {
        text: String,
        variables: usize,
        data_lines: usize,
    },
    Table(TabularDataset),
}

impl Artifact {
    /// (rows, columns) of what will be written.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Artifact::Record {
                variables,
                data_lines,
                ..
            } => (*data_lines, *variables),
            Artifact::Table(ds) => (ds.num_rows(), ds.num_columns()),
        }
    }

    /// Write to `dest` via a temporary sibling so no partial file is left behind.
    pub fn persist(&self, dest: &Path) -> Result<u64> {
        match self {
            Artifact::Record { text, .. } => write_text_atomic(text, dest),
            Artifact::Table(ds) => parquet::write_dataset(ds, dest),
        }
    }
}

fn write_text_atomic(text: &str, dest: &Path) -> Result<u64> {
    write_atomic(dest, |file| {
        file.write_all(text.as_bytes())
            .with_context(|| format!("writing {}", dest.display()))
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn file_name_of(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| anyhow!("input path has no file name: {}", path.display()))
}

/// Dumps are read leniently: invalid UTF-8 bytes are replaced, not fatal.
fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Rewrites record headers through a name mapping.
pub struct RenameStage {
    mapping: Arc<NameMapping>,
}

impl RenameStage {
    pub fn new(mapping: Arc<NameMapping>) -> Self {
        Self { mapping }
    }
}

impl Stage for RenameStage {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "plt")
    }

    fn output_name(&self, input: &Path) -> Result<PathBuf> {
        Ok(PathBuf::from(file_name_of(input)?))
    }

    fn compute(&self, input: &Path) -> Result<Artifact> {
        let file = file_name_of(input)?.to_string_lossy();
        let content = read_text_lossy(input)?;
        let doc = record::parse(&content).with_context(|| format!("parsing {}", file))?;
        let (text, misses) = rename_document(&doc, &*self.mapping, &file);
        debug!(file = %file, misses = misses.len(), "header rewritten");
        Ok(Artifact::Record {
            text,
            variables: doc.variable_count,
            data_lines: doc.data_lines.len(),
        })
    }
}

/// Turns renamed records into Parquet tables.
pub struct DecodeStage;

impl Stage for DecodeStage {
    fn name(&self) -> &'static str {
        "decode"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "plt")
    }

    fn output_name(&self, input: &Path) -> Result<PathBuf> {
        Ok(PathBuf::from(file_name_of(input)?).with_extension("parquet"))
    }

    fn compute(&self, input: &Path) -> Result<Artifact> {
        let file = file_name_of(input)?.to_string_lossy();
        let content = read_text_lossy(input)?;
        let doc = record::parse(&content).with_context(|| format!("parsing {}", file))?;
        let ds = decode_document(&doc).with_context(|| format!("decoding {}", file))?;
        Ok(Artifact::Table(ds))
    }
}

/// Puts persisted tables on a fixed-rate grid.
pub struct ResampleStage {
    resampler: Resampler,
}

impl ResampleStage {
    pub fn new(resampler: Resampler) -> Self {
        Self { resampler }
    }
}

impl Stage for ResampleStage {
    fn name(&self) -> &'static str {
        "resample"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "parquet")
    }

    fn output_name(&self, input: &Path) -> Result<PathBuf> {
        Ok(PathBuf::from(file_name_of(input)?))
    }

    fn compute(&self, input: &Path) -> Result<Artifact> {
        let file = file_name_of(input)?.to_string_lossy();
        let batch = parquet::read_batch(input)?;
        let ds = self
            .resampler
            .resample(&batch)
            .with_context(|| format!("resampling {}", file))?;
        info!(
            file = %file,
            "orig: {} → final({} Hz): {}",
            batch.num_rows(),
            self.resampler.frequency_hz(),
            ds.num_rows()
        );
        Ok(Artifact::Table(ds))
    }
}
