use std::{path::PathBuf, time::Duration};

use benchrs::InstrumentError;
use thiserror::Error;

/// Errors of the measurement routines and the files they write.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Instrument error: {0}")]
    Instrument(#[from] InstrumentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Plotting failed: {0}")]
    Plot(String),
    #[error("Temperature did not settle at {target} K within {timeout:?}, last reading {last} K")]
    TemperatureNotReached {
        target: f64,
        last: f64,
        timeout: Duration,
    },
    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),
    #[error("Row with {got} values does not fit a table with {expected} columns")]
    RowWidth { expected: usize, got: usize },
    #[error("The experiment needs a {0}, but none is configured")]
    MissingInstrument(String),
    #[error("Unsupported connection: {0}")]
    UnsupportedConnection(String),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors while loading the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}
