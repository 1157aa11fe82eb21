//! Tables of measured values and the files they are saved to.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::BenchError;

/// A table of named `f64` columns, filled row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl DataTable {
    /// Create an empty table with the given column names.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, which must have one value per column.
    pub fn push_row(&mut self, row: Vec<f64>) -> Result<(), BenchError> {
        if row.len() != self.columns.len() {
            return Err(BenchError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// The column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in the order they were pushed.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The values of the named column, `None` if there is no such column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Pairs of values from two columns, as used for plotting.
    pub fn xy(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        Some(self.column(x)?.into_iter().zip(self.column(y)?).collect())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were pushed yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV with a header line.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), BenchError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// What was measured, on which sample, when, and with which settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub experiment: String,
    pub sample: String,
    pub timestamp: String,
    pub parameters: BTreeMap<String, String>,
}

impl RunMetadata {
    /// Metadata stamped with the current local time.
    pub fn new(experiment: &str, sample: &str) -> Self {
        Self {
            experiment: experiment.to_string(),
            sample: sample.to_string(),
            timestamp: Local::now().to_rfc3339(),
            parameters: BTreeMap::new(),
        }
    }

    /// Record a parameter, replacing an earlier value with the same key.
    pub fn insert<V: ToString>(&mut self, key: &str, value: V) {
        self.parameters.insert(key.to_string(), value.to_string());
    }

    pub fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), BenchError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }
}

/// Common path stem for all files of one run: `<dir>/<sample>_<experiment>_<timestamp>`.
///
/// The data, metadata and plot files append their own extension.
pub fn output_stem(dir: &Path, sample: &str, experiment: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{sample}_{experiment}_{timestamp}"))
}

/// A histogram with equally wide bins spanning the range of the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub centers: Vec<f64>,
    pub counts: Vec<u64>,
    pub bin_width: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Histogram {
    /// Sort the values into `bins` bins between their minimum and maximum.
    ///
    /// If all values are equal, a single bin holds all of them.
    pub fn from_values(values: &[f64], bins: usize) -> Result<Self, BenchError> {
        if values.is_empty() || bins == 0 {
            return Err(BenchError::InvalidSweep(
                "A histogram needs at least one value and one bin".to_string(),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (centers, counts, bin_width) = if max > min {
            let width = (max - min) / bins as f64;
            let mut counts = vec![0u64; bins];
            for v in values {
                let idx = (((v - min) / width) as usize).min(bins - 1);
                counts[idx] += 1;
            }
            let centers = (0..bins)
                .map(|i| min + (i as f64 + 0.5) * width)
                .collect();
            (centers, counts, width)
        } else {
            (vec![min], vec![values.len() as u64], 0.0)
        };

        Ok(Self {
            centers,
            counts,
            bin_width,
            mean: mean(values),
            std_dev: std_dev(values),
        })
    }

    /// Histogram as a table with the columns `center` and `count`.
    pub fn to_table(&self) -> DataTable {
        let mut table = DataTable::new(&["center", "count"]);
        table.rows = self
            .centers
            .iter()
            .zip(&self.counts)
            .map(|(c, n)| vec![*c, *n as f64])
            .collect();
        table
    }
}

/// Arithmetic mean, NaN for no values.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, zero for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup() {
        let mut table = DataTable::new(&["a", "b"]);
        table.push_row(vec![1.0, 2.0]).unwrap();
        table.push_row(vec![3.0, 4.0]).unwrap();
        assert_eq!(table.column("b"), Some(vec![2.0, 4.0]));
        assert_eq!(table.column("c"), None);
        assert_eq!(table.xy("a", "b"), Some(vec![(1.0, 2.0), (3.0, 4.0)]));
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[2.0]), 0.0);
        assert!((std_dev(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }
}
