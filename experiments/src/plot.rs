//! SVG plots of measured data.

use std::{ops::Range, path::Path};

use plotters::prelude::*;

use crate::BenchError;

const SIZE: (u32, u32) = (1024, 768);

/// One labelled line of an xy plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: &str, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.to_string(),
            points,
        }
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> BenchError {
    BenchError::Plot(e.to_string())
}

/// Range covering all values, widened if it would be empty.
fn span<I: Iterator<Item = f64>>(values: I) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return 0.0..1.0;
    }
    if max > min {
        let pad = (max - min) * 0.05;
        (min - pad)..(max + pad)
    } else {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        (min - pad)..(max + pad)
    }
}

/// Draw one or more series as lines into an SVG file.
pub fn plot_xy<P: AsRef<Path>>(
    path: P,
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[Series],
) -> Result<(), BenchError> {
    let root = SVGBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let x_range = span(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let y_range = span(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(plot_err)?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
            .map_err(plot_err)?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Color of a value scaled to 0..=1, dark blue over green to yellow.
fn heat_color(frac: f64) -> RGBColor {
    let f = if frac.is_finite() {
        frac.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let r = (255.0 * (1.5 * f - 0.5).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * (1.2 * f).min(1.0)) as u8;
    let b = (160.0 * (1.0 - f)) as u8;
    RGBColor(r, g, b)
}

/// Draw a 2D grid as a heat map into an SVG file.
///
/// `grid[row][col]` is drawn at x = col, y = row.
pub fn plot_map<P: AsRef<Path>>(path: P, title: &str, grid: &[Vec<f64>]) -> Result<(), BenchError> {
    let ny = grid.len();
    let nx = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    if nx == 0 {
        return Err(BenchError::Plot("Cannot plot an empty map".to_string()));
    }

    let root = SVGBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..nx as f64, 0.0..ny as f64)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x step")
        .y_desc("y step")
        .draw()
        .map_err(plot_err)?;

    let range = span(grid.iter().flatten().copied());
    let (lo, hi) = (range.start, range.end);

    chart
        .draw_series(grid.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, v)| {
                let color = heat_color((v - lo) / (hi - lo));
                Rectangle::new(
                    [(x as f64, y as f64), (x as f64 + 1.0, y as f64 + 1.0)],
                    color.filled(),
                )
            })
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_pads_single_value() {
        let r = span([2.0, 2.0].into_iter());
        assert!(r.start < 2.0 && r.end > 2.0);
        assert_eq!(span(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_heat_color_ends() {
        let rgb = |c: RGBColor| (c.0, c.1, c.2);
        assert_eq!(rgb(heat_color(0.0)), (0, 0, 160));
        assert_eq!(rgb(heat_color(1.0)), (255, 255, 0));
        assert_eq!(rgb(heat_color(f64::NAN)), (0, 0, 160));
    }
}
