//! Raster scans with stepping positioners.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::{
    BenchError,
    data::DataTable,
    roles::{PhotonCounter, Positioner},
    sweep::secs,
};

/// Grid and timing of a raster scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterSettings {
    /// Number of columns.
    pub nx: usize,
    /// Number of rows.
    pub ny: usize,
    /// Steps of the x axis between two columns, the sign gives the direction.
    pub step_x: i64,
    /// Steps of the y axis between two rows, the sign gives the direction.
    pub step_y: i64,
    /// Counter gate time in s.
    pub gate_s: f64,
    /// Wait after each move in s.
    pub settle_s: f64,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            nx: 20,
            ny: 20,
            step_x: 10,
            step_y: 10,
            gate_s: 0.5,
            settle_s: 0.2,
        }
    }
}

/// Count rates of a raster scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub step_x: i64,
    pub step_y: i64,
    /// Rates in counts per second, `counts[row][col]`, row 0 at the start position.
    pub counts: Vec<Vec<f64>>,
}

impl RasterGrid {
    /// One row per grid point with its indices, position in steps and rate.
    pub fn to_table(&self) -> Result<DataTable, BenchError> {
        let mut table = DataTable::new(&["col", "row", "x_steps", "y_steps", "rate"]);
        for (row, values) in self.counts.iter().enumerate() {
            for (col, rate) in values.iter().enumerate() {
                table.push_row(vec![
                    col as f64,
                    row as f64,
                    (col as i64 * self.step_x) as f64,
                    (row as i64 * self.step_y) as f64,
                    *rate,
                ])?;
            }
        }
        Ok(table)
    }
}

/// Scan an `nx` by `ny` grid in a serpentine path and count at every position.
///
/// Rows alternate direction so that x never travels back empty. Both axes are moved back to the
/// start position at the end, also when the scan fails.
pub fn raster_scan<X, Y, C>(
    x: &mut X,
    y: &mut Y,
    counter: &mut C,
    settings: &RasterSettings,
) -> Result<RasterGrid, BenchError>
where
    X: Positioner + ?Sized,
    Y: Positioner + ?Sized,
    C: PhotonCounter + ?Sized,
{
    if settings.nx == 0 || settings.ny == 0 {
        return Err(BenchError::InvalidSweep(format!(
            "Raster of {} x {} points is empty",
            settings.nx, settings.ny
        )));
    }
    let gate = secs(settings.gate_s)?;
    let settle = secs(settings.settle_s)?;

    let mut counts = vec![vec![0.0; settings.nx]; settings.ny];
    // Current position in grid indices.
    let mut col = 0usize;
    let mut row = 0usize;

    let scanned = (|| -> Result<(), BenchError> {
        for r in 0..settings.ny {
            if r > 0 {
                y.move_steps(settings.step_y)?;
                row = r;
                thread::sleep(settle);
            }
            let forward = r % 2 == 0;
            for i in 0..settings.nx {
                if i > 0 {
                    if forward {
                        x.move_steps(settings.step_x)?;
                        col += 1;
                    } else {
                        x.move_steps(-settings.step_x)?;
                        col -= 1;
                    }
                    thread::sleep(settle);
                }
                counts[row][col] = counter.count_rate(gate)?;
            }
            log::info!("Row {} of {} done", r + 1, settings.ny);
        }
        Ok(())
    })();

    let back_x = match col {
        0 => Ok(()),
        _ => x.move_steps(-(col as i64) * settings.step_x),
    };
    let back_y = match row {
        0 => Ok(()),
        _ => y.move_steps(-(row as i64) * settings.step_y),
    };
    scanned?;
    back_x?;
    back_y?;

    Ok(RasterGrid {
        step_x: settings.step_x,
        step_y: settings.step_y,
        counts,
    })
}
