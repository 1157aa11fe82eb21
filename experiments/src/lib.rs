//! Measurement routines for superconducting nanowire single-photon detectors (SNSPDs).
//!
//! Routines sequence the instrument drivers of this workspace: set a parameter, wait, read a
//! value, append it to a table, and finally save the table with its metadata and a plot. They are
//! written against the small traits in [`roles`] such that, e.g., the bias can come from a SIM928
//! or from a function generator in DC mode.
//!
//! - [`ic_sweep`]: switching current histograms and stepped IV curves
//! - [`counts`]: counts versus bias and versus attenuation
//! - [`thermal`]: ramp to a temperature, wait until it is stable, scan temperatures
//! - [`raster`]: serpentine raster scans with a piezo stepper
//! - [`vna`]: network analyzer spectroscopy, optionally versus temperature
//!
//! The `snspd-bench` binary reads a [`config::BenchConfig`] from YAML, opens the instruments and
//! runs one experiment through [`bench::run`].

pub mod bench;
pub mod config;
pub mod counts;
pub mod data;
mod error;
pub mod ic_sweep;
pub mod plot;
pub mod raster;
pub mod roles;
pub mod sweep;
pub mod thermal;
pub mod vna;

pub use error::{BenchError, ConfigError};
