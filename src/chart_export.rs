//! Chart export to PNG (plotters bitmap) and SVG (plotters svg).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::chart_data::ChartData;

pub const DEFAULT_EXPORT_SIZE: (u32, u32) = (800, 480);

const PALETTE: [RGBColor; 7] = [
    CYAN,
    MAGENTA,
    GREEN,
    YELLOW,
    BLUE,
    RED,
    RGBColor(128, 255, 255),
];

/// Export format for chart: PNG or SVG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartExportFormat {
    Png,
    Svg,
}

impl ChartExportFormat {
    pub const ALL: [Self; 2] = [Self::Png, Self::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }

    /// Format implied by the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// `<dir>/genre-trends-<timestamp>.<ext>`
pub fn default_export_path(dir: &Path, format: ChartExportFormat) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("genre-trends-{}.{}", stamp, format.extension()))
}

/// Final path and format for an export request. The extension picks the
/// format; a path without one gets `fallback` and its extension appended.
pub fn resolve_export_target(
    path: &Path,
    fallback: ChartExportFormat,
) -> Result<(PathBuf, ChartExportFormat)> {
    match ChartExportFormat::from_path(path) {
        Some(format) => Ok((path.to_path_buf(), format)),
        None if path.extension().is_none() => {
            Ok((path.with_extension(fallback.extension()), fallback))
        }
        None => Err(eyre!(
            "Cannot export to {}: use a .png or .svg file name.",
            path.display()
        )),
    }
}

/// Write the chart to `path`. Exporting a chart without points is an error.
pub fn write_chart(
    path: &Path,
    format: ChartExportFormat,
    data: &ChartData,
    size: (u32, u32),
) -> Result<()> {
    if data.is_empty() {
        return Err(eyre!("No data to export"));
    }
    match format {
        ChartExportFormat::Png => draw(BitMapBackend::new(path, size).into_drawing_area(), data)?,
        ChartExportFormat::Svg => draw(SVGBackend::new(path, size).into_drawing_area(), data)?,
    }
    tracing::info!(path = %path.display(), format = format.as_str(), "chart exported");
    Ok(())
}

fn draw<DB>(root: DrawingArea<DB, Shift>, data: &ChartData) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let Some((_, _, y_lo, y_hi)) = data.bounds() else {
        return Err(eyre!("No data to export"));
    };
    let y_lo = y_lo.min(0.0);
    let y_hi = if y_hi > y_lo { y_hi * 1.05 } else { y_lo + 1.0 };
    let last = (data.categories.len() as i32 - 1).max(1);

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Genre popularity over time", ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..last, y_lo..y_hi)?;

    let format_category =
        |x: &i32| -> String { data.category_label(*x as f64).unwrap_or("").to_string() };
    chart
        .configure_mesh()
        .x_labels(data.categories.len().max(2))
        .x_label_formatter(&format_category)
        .x_desc("year")
        .y_desc("popularity")
        .draw()?;

    for (idx, series) in data.series.iter().enumerate() {
        if series.points.is_empty() {
            continue;
        }
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(
                series.points.iter().map(|&(x, y)| (x as i32, y)),
                color.stroke_width(2),
            ))?
            .label(series.genre.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
