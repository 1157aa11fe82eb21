//! Tests for data tables, metadata and histograms.

use std::fs;

use rstest::*;
use tempfile::tempdir;

use snspd_bench::{BenchError, data::*};

#[fixture]
fn table() -> DataTable {
    let mut table = DataTable::new(&["bias_voltage", "rate"]);
    table.push_row(vec![0.0, 10.0]).unwrap();
    table.push_row(vec![0.5, 12.5]).unwrap();
    table
}

#[rstest]
fn test_push_row_width(mut table: DataTable) {
    let err = table.push_row(vec![1.0]).unwrap_err();
    assert!(matches!(
        err,
        BenchError::RowWidth {
            expected: 2,
            got: 1
        }
    ));
    assert_eq!(table.len(), 2);
}

#[rstest]
fn test_write_csv(table: DataTable) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("counts.csv");

    table.write_csv(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["bias_voltage,rate", "0,10", "0.5,12.5"]);
}

#[rstest]
fn test_metadata_yaml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.yaml");
    let mut meta = RunMetadata::new("counts_vs_bias", "W1_D4");
    meta.insert("gate_s", 0.5);

    meta.write_yaml(&path).unwrap();

    let read: RunMetadata = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(read, meta);
    assert_eq!(read.parameters["gate_s"], "0.5");
}

#[rstest]
fn test_output_stem() {
    let dir = tempdir().unwrap();
    let stem = output_stem(dir.path(), "W1_D4", "raster");

    assert_eq!(stem.parent().unwrap(), dir.path());
    let name = stem.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("W1_D4_raster_"));
    // YYYY-mm-dd_HH-MM-SS
    assert_eq!(name.len(), "W1_D4_raster_".len() + 19);
}

#[rstest]
fn test_histogram() {
    let hist = Histogram::from_values(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();

    assert_eq!(hist.bin_width, 1.5);
    assert_eq!(hist.centers, vec![0.75, 2.25]);
    assert_eq!(hist.counts, vec![2, 2]);
    assert_eq!(hist.mean, 1.5);

    let table = hist.to_table();
    assert_eq!(table.column("count").unwrap(), vec![2.0, 2.0]);
}

#[rstest]
fn test_histogram_equal_values() {
    let hist = Histogram::from_values(&[1.0, 1.0, 1.0], 5).unwrap();
    assert_eq!(hist.centers, vec![1.0]);
    assert_eq!(hist.counts, vec![3]);
    assert_eq!(hist.std_dev, 0.0);
}

#[rstest]
#[case(vec![], 10)]
#[case(vec![1.0], 0)]
fn test_histogram_invalid(#[case] values: Vec<f64>, #[case] bins: usize) {
    assert!(Histogram::from_values(&values, bins).is_err());
}
