use crate::pipeline::PulseAnalysis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

impl Style {
    /// Dash and gap lengths in whole pixels for raster backends, `None` for
    /// a solid line. Lengths round to at least one pixel.
    pub fn dash_pixels(&self) -> Option<(u32, u32)> {
        self.dash
            .map(|[on, off]| (on.round().max(1.0) as u32, off.round().max(1.0) as u32))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn name(&self) -> &str {
        match self {
            Series::Line(line) => &line.name,
            Series::Markers(markers) => &markers.name,
        }
    }

    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// (min, max) over every point of every series, `None` for an empty figure.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        let mut x = [first[0], first[0]];
        let mut y = [first[1], first[1]];
        for p in points {
            x = [x[0].min(p[0]), x[1].max(p[0])];
            y = [y[0].min(p[1]), y[1].max(p[1])];
        }
        Some((x, y))
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points || max_points == 0 {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

fn horizontal(name: &str, y: f64, x_max: f64, color: u32) -> Series {
    Series::Line(LineSeries {
        name: name.into(),
        points: vec![[0.0, y], [x_max, y]],
        style: Style {
            width: 1.0,
            dash: Some([6.0, 4.0]),
            color: Color(color),
        },
    })
}

/// Trimmed signal with mean and threshold lines, detected and selected peaks.
/// The x axis is the frame index within the trimmed signal.
pub fn figure_from_analysis(analysis: &PulseAnalysis, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some(analysis.summary()));
    fig.x.label = Some("frame".into());
    fig.y.label = Some("mean brightness".into());
    let points: Vec<[f64; 2]> = analysis
        .trimmed
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64, *value])
        .collect();
    let x_max = analysis.trimmed.len().saturating_sub(1) as f64;
    fig.add_series(Series::Line(LineSeries {
        name: "signal".into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            dash: None,
            color: Color(0x1F77B4),
        },
    }));
    fig.add_series(horizontal("mean", analysis.mean, x_max, 0xD62728));
    fig.add_series(horizontal("Q3", analysis.threshold, x_max, 0xFF7F0E));
    fig.add_series(Series::Markers(MarkerSeries {
        name: "detected peaks".into(),
        points: analysis
            .peaks
            .iter()
            .map(|p| [p.index as f64, p.value])
            .collect(),
        radius: 3,
        color: Color(0x2CA02C),
    }));
    fig.add_series(Series::Markers(MarkerSeries {
        name: "selected peaks".into(),
        points: [analysis.selected.first, analysis.selected.second]
            .iter()
            .map(|p| [p.index as f64, p.value])
            .collect(),
        radius: 5,
        color: Color(0x9467BD),
    }));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PipelineConfig, pipeline::analyze_signal, signal::TimeSeries};

    #[test]
    fn decimation_keeps_short_series() {
        let pts = vec![[0.0, 1.0], [1.0, 2.0]];
        assert_eq!(decimate_points(&pts, 10), pts);
        let long: Vec<[f64; 2]> = (0..100).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&long, 10);
        assert_eq!(out.len(), 10);
        assert_eq!(out[1], [10.0, 0.0]);
    }

    #[test]
    fn analysis_figure_layers() {
        let mut data = vec![1.0; 40];
        data[0] = 0.0;
        data[6] = 9.0;
        data[21] = 7.0;
        let analysis =
            analyze_signal(&TimeSeries::new(30.0, data), &PipelineConfig::default()).unwrap();
        let fig = figure_from_analysis(&analysis, 1024);
        let names: Vec<&str> = fig.series.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["signal", "mean", "Q3", "detected peaks", "selected peaks"]
        );
        assert_eq!(fig.series[0].points().len(), 39);
        assert_eq!(fig.series[4].points(), &[[5.0, 9.0], [20.0, 7.0]]);
        assert_eq!(fig.title.as_deref(), Some("heart rate: 120.00 bpm"));
        let (x, y) = fig.bounds().unwrap();
        assert_eq!(x, [0.0, 38.0]);
        assert_eq!(y, [1.0, 9.0]);
    }

    #[test]
    fn reference_levels_are_dashed() {
        let mut data = vec![1.0; 40];
        data[0] = 0.0;
        data[6] = 9.0;
        data[21] = 7.0;
        let analysis =
            analyze_signal(&TimeSeries::new(30.0, data), &PipelineConfig::default()).unwrap();
        let fig = figure_from_analysis(&analysis, 1024);
        let dashes: Vec<(&str, Option<(u32, u32)>)> = fig
            .series
            .iter()
            .filter_map(|s| match s {
                Series::Line(line) => Some((line.name.as_str(), line.style.dash_pixels())),
                Series::Markers(_) => None,
            })
            .collect();
        assert_eq!(
            dashes,
            vec![("signal", None), ("mean", Some((6, 4))), ("Q3", Some((6, 4)))]
        );
    }

    #[test]
    fn dash_lengths_round_to_whole_pixels() {
        let style = Style {
            width: 1.0,
            dash: Some([2.6, 0.2]),
            color: Color(0),
        };
        assert_eq!(style.dash_pixels(), Some((3, 1)));
    }

    #[test]
    fn color_splits_into_channels() {
        assert_eq!(Color(0x1F77B4).rgb(), (0x1F, 0x77, 0xB4));
    }
}
