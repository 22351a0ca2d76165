use plotters::prelude::*;
use thiserror::Error;

use crate::models::history::HistoryPoint;

pub const CHART_WIDTH: u32 = 720;
pub const CHART_HEIGHT: u32 = 360;

const LINE_COLOR: RGBColor = RGBColor(0, 123, 255);

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Incorrect input data to chart")]
    IncorrectInputData,
    #[error("Plotter error: {0}")]
    PlotterError(String),
}

fn plotter_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::PlotterError(err.to_string())
}

/// Renders `history` as an SVG line chart, one x tick per point.
pub fn render_temperature_chart(history: &[HistoryPoint]) -> Result<String, ChartError> {
    if history.is_empty() || history.iter().any(|point| !point.temperature.is_finite()) {
        return Err(ChartError::IncorrectInputData);
    }

    let labels: Vec<String> = history.iter().map(HistoryPoint::label).collect();
    let last_index = (history.len() - 1).max(1) as i32;
    let y_min = history
        .iter()
        .fold(f64::INFINITY, |a, point| a.min(point.temperature));
    let y_max = history
        .iter()
        .fold(f64::NEG_INFINITY, |a, point| a.max(point.temperature));
    let points: Vec<(i32, f64)> = history
        .iter()
        .enumerate()
        .map(|(index, point)| (index as i32, point.temperature))
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(plotter_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(0..last_index, (y_min - 1.0)..(y_max + 1.0))
            .map_err(plotter_error)?;
        chart
            .configure_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|index| {
                usize::try_from(*index)
                    .ok()
                    .and_then(|index| labels.get(index))
                    .cloned()
                    .unwrap_or_default()
            })
            .y_labels(6)
            .y_label_formatter(&|temperature| format!("{temperature:.1}"))
            .x_desc("Date")
            .y_desc("Temp (°C)")
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(plotter_error)?;

        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                LINE_COLOR.stroke_width(2),
            ))
            .map_err(plotter_error)?
            .label("Temperature (°C)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR));
        chart
            .draw_series(
                points
                    .iter()
                    .map(|point| Circle::new(*point, 4, LINE_COLOR.filled())),
            )
            .map_err(plotter_error)?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plotter_error)?;
        root.present().map_err(plotter_error)?;
    }
    Ok(svg)
}
