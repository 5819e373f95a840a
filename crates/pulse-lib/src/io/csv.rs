use crate::pipeline::PulseAnalysis;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One row of the annotated trimmed signal.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedSample {
    pub index: usize,
    pub time_s: f64,
    pub value: f64,
    pub is_peak: bool,
    pub is_selected: bool,
}

pub fn annotated_samples(analysis: &PulseAnalysis) -> Vec<AnnotatedSample> {
    let dt = 1.0 / analysis.fs;
    let peaks = analysis.peak_indices();
    let selected = analysis.selected.indices();
    analysis
        .trimmed
        .data
        .iter()
        .enumerate()
        .map(|(index, &value)| AnnotatedSample {
            index,
            time_s: index as f64 * dt,
            value,
            is_peak: peaks.binary_search(&index).is_ok(),
            is_selected: selected.contains(&index),
        })
        .collect()
}

pub fn write_annotated_csv<W: Write>(out: W, analysis: &PulseAnalysis) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);
    for row in annotated_samples(analysis) {
        writer.serialize(row).context("writing csv row")?;
    }
    writer.flush().context("flushing csv")?;
    Ok(())
}

pub fn save_annotated_csv(path: &Path, analysis: &PulseAnalysis) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_annotated_csv(file, analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PipelineConfig, pipeline::analyze_signal, signal::TimeSeries};

    fn analysis() -> PulseAnalysis {
        let mut data = vec![1.0; 20];
        data[0] = 0.0;
        data[4] = 6.0;
        data[9] = 5.0;
        data[15] = 4.0;
        analyze_signal(&TimeSeries::new(10.0, data), &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn rows_flag_peaks_and_pair() {
        let rows = annotated_samples(&analysis());
        assert_eq!(rows.len(), 19);
        let peaks: Vec<usize> = rows.iter().filter(|r| r.is_peak).map(|r| r.index).collect();
        assert_eq!(peaks, vec![3, 8, 14]);
        let selected: Vec<usize> = rows
            .iter()
            .filter(|r| r.is_selected)
            .map(|r| r.index)
            .collect();
        assert_eq!(selected, vec![3, 8]);
        assert!((rows[8].time_s - 0.8).abs() < 1e-12);
    }

    #[test]
    fn csv_has_header_and_one_line_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signal.csv");
        save_annotated_csv(&path, &analysis()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("index,time_s,value,is_peak,is_selected")
        );
        assert_eq!(lines.count(), 19);
    }
}
