// src/mapping.rs

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::{collections::HashMap, fs::File, path::Path};
use tracing::{debug, info};

/// Anything that can answer "what should this variable be called".
/// `None` means keep the original name.
pub trait NameLookup {
    fn lookup(&self, original: &str) -> Option<String>;
}

impl<F> NameLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, original: &str) -> Option<String> {
        self(original)
    }
}

/// Original variable name → replacement, both trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    entries: HashMap<String, String>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one table row. Blank originals are ignored; a blank replacement
    /// maps the name onto itself.
    pub fn insert(&mut self, original: &str, replacement: &str) {
        let original = original.trim();
        if original.is_empty() {
            return;
        }
        let replacement = match replacement.trim() {
            "" => original,
            r => r,
        };
        self.entries
            .insert(original.to_string(), replacement.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the two-column mapping table from a CSV with a header row.
    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        original_column: &str,
        replacement_column: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening mapping table {}", path.display()))?;
        Self::from_reader(file, original_column, replacement_column)
            .with_context(|| format!("reading mapping table {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(
        reader: R,
        original_column: &str,
        replacement_column: &str,
    ) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().context("reading header row")?.clone();
        let position = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim() == wanted)
                .ok_or_else(|| anyhow!("column {:?} not found in {:?}", wanted, headers))
        };
        let orig_idx = position(original_column)?;
        let new_idx = position(replacement_column)?;

        let mut mapping = Self::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("CSV parse error at record {}", idx))?;
            let original = record.get(orig_idx).unwrap_or_default();
            let replacement = record.get(new_idx).unwrap_or_default();
            mapping.insert(original, replacement);
        }

        debug!(entries = mapping.len(), "parsed mapping rows");
        info!("{} mappings loaded", mapping.len());
        Ok(mapping)
    }
}

impl NameLookup for NameMapping {
    fn lookup(&self, original: &str) -> Option<String> {
        self.entries.get(original).cloned()
    }
}

impl FromIterator<(String, String)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (original, replacement) in iter {
            mapping.insert(&original, &replacement);
        }
        mapping
    }
}
