use plotters::prelude::*;

use crate::error::{Error, Result};

const SIZE: (u32, u32) = (800, 480);

/// Line chart description: 1-based sequence numbers against predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(usize, f64)>,
}

impl ChartSpec {
    pub fn prediction_trend(points: Vec<(usize, f64)>) -> Self {
        Self {
            title: "PM2.5 Prediction Trend".to_string(),
            x_label: "Prediction #".to_string(),
            y_label: "PM2.5 (µg/m³)".to_string(),
            points,
        }
    }

    fn y_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));

        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        let pad = ((hi - lo) * 0.1).max(1.0);
        (lo - pad, hi + pad)
    }

    /// Draw the series with markers as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(export_err)?;

            let max_x = self.points.len().max(1) as f64;
            let (min_y, max_y) = self.y_range();

            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 24))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(0.5f64..max_x + 0.5, min_y..max_y)
                .map_err(export_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(self.points.len().clamp(1, 10))
                .x_label_formatter(&|x: &f64| format!("{x:.0}"))
                .x_desc(self.x_label.as_str())
                .y_desc(self.y_label.as_str())
                .draw()
                .map_err(export_err)?;

            let series: Vec<(f64, f64)> =
                self.points.iter().map(|&(x, y)| (x as f64, y)).collect();

            chart
                .draw_series(LineSeries::new(series.iter().copied(), &BLUE))
                .map_err(export_err)?;
            chart
                .draw_series(series.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
                .map_err(export_err)?;

            root.present().map_err(export_err)?;
        }
        Ok(svg)
    }
}

fn export_err(e: impl std::fmt::Display) -> Error {
    Error::Export(format!("failed to draw chart: {e}"))
}
