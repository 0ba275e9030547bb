// src/resample/locate.rs

use arrow::datatypes::Field;
use tracing::debug;

/// Picks the time column out of a table's column names.
pub trait TimeColumnLocator: Send + Sync {
    fn locate(&self, names: &[&str]) -> Option<usize>;

    /// Human-readable form of the rule, used in diagnostics.
    fn describe(&self) -> String;
}

/// First column whose name contains `needle`, ignoring case.
#[derive(Debug, Clone)]
pub struct SubstringLocator {
    needle: String,
}

impl SubstringLocator {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }
}

impl TimeColumnLocator for SubstringLocator {
    fn locate(&self, names: &[&str]) -> Option<usize> {
        let mut matches = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.to_lowercase().contains(&self.needle))
            .map(|(idx, _)| idx);
        let first = matches.next()?;
        let others = matches.count();
        if others > 0 {
            debug!(
                needle = %self.needle,
                chosen = %names[first],
                others,
                "several columns match the time hint, using the first"
            );
        }
        Some(first)
    }

    fn describe(&self) -> String {
        self.needle.clone()
    }
}

/// Decides which non-time columns are carried into the resampled output.
pub trait ColumnClassifier: Send + Sync {
    fn is_resamplable(&self, field: &Field) -> bool;
}

/// Integer, float and decimal columns. Strings, booleans, dates and nested
/// types are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericColumns;

impl ColumnClassifier for NumericColumns {
    fn is_resamplable(&self, field: &Field) -> bool {
        field.data_type().is_numeric()
    }
}
