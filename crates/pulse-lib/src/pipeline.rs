use crate::{
    config::PipelineConfig,
    detectors::{detect_peaks, trim_lead_in, Onset},
    error::PulseError,
    frames::{extract_brightness, FrameSource, Progress},
    metrics::rate::{estimate_rate, HeartRate},
    signal::{Peak, SelectedPair, TimeSeries},
};
use serde::{Deserialize, Serialize};

/// Everything one run produces, ready for plotting or serialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseAnalysis {
    pub fs: f64,
    /// Raw samples before trimming.
    pub sample_count: usize,
    pub onset: Onset,
    pub trimmed: TimeSeries,
    pub mean: f64,
    pub threshold: f64,
    pub peaks: Vec<Peak>,
    pub selected: SelectedPair,
    pub frames_between_peaks: usize,
    pub heart_rate_bpm: f64,
}

impl PulseAnalysis {
    pub fn peak_indices(&self) -> Vec<usize> {
        self.peaks.iter().map(|p| p.index).collect()
    }

    pub fn summary(&self) -> String {
        format!("heart rate: {:.2} bpm", self.heart_rate_bpm)
    }
}

/// Analyse an already extracted brightness series.
pub fn analyze_signal(
    raw: &TimeSeries,
    cfg: &PipelineConfig,
) -> Result<PulseAnalysis, PulseError> {
    if !(raw.fs > 0.0 && raw.fs.is_finite()) {
        return Err(PulseError::InvalidSamplingRate { fs: raw.fs });
    }
    let (onset, trimmed) = trim_lead_in(raw, cfg.required_samples())?;
    let detection = detect_peaks(&trimmed, cfg.percentile());
    let HeartRate {
        bpm,
        frames_between_peaks,
        pair,
    } = estimate_rate(&detection.peaks, trimmed.fs, detection.threshold, cfg.pairing)?;
    log::info!(
        "{} samples ({:.1} s), onset {}, {} peak(s), {:.2} bpm",
        raw.len(),
        raw.duration(),
        onset.index,
        detection.peaks.len(),
        bpm
    );
    Ok(PulseAnalysis {
        fs: raw.fs,
        sample_count: raw.len(),
        onset,
        mean: trimmed.mean(),
        trimmed,
        threshold: detection.threshold,
        peaks: detection.peaks,
        selected: pair,
        frames_between_peaks,
        heart_rate_bpm: bpm,
    })
}

/// Buffer the whole source into a brightness series, then analyse it.
pub fn analyze_source<S, F>(
    source: &mut S,
    cfg: &PipelineConfig,
    progress: F,
) -> Result<PulseAnalysis, PulseError>
where
    S: FrameSource + ?Sized,
    F: FnMut(Progress),
{
    let raw = extract_brightness(source, progress);
    analyze_signal(&raw, cfg)
}
