use crate::{
    metrics::stats::percentile,
    signal::{Peak, TimeSeries},
};
use serde::{Deserialize, Serialize};

/// Peaks of a series together with the height floor they had to clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDetection {
    pub threshold: f64,
    pub peaks: Vec<Peak>,
}

impl PeakDetection {
    pub fn indices(&self) -> Vec<usize> {
        self.peaks.iter().map(|p| p.index).collect()
    }
}

/// Strict local maxima of `data` whose height is at least `threshold`.
///
/// Endpoints are never peaks and equal neighbours (plateaus) do not qualify.
pub fn find_peaks(data: &[f64], threshold: f64) -> Vec<Peak> {
    if data.len() < 3 {
        return Vec::new();
    }
    data.windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] >= threshold)
        .map(|(i, w)| Peak {
            index: i + 1,
            value: w[1],
        })
        .collect()
}

/// Detect peaks above the given percentile (75 for the upper quartile).
pub fn detect_peaks(ts: &TimeSeries, threshold_percentile: f64) -> PeakDetection {
    let threshold = percentile(&ts.data, threshold_percentile).unwrap_or(f64::NAN);
    let peaks = find_peaks(&ts.data, threshold);
    log::debug!(
        "p{} threshold {:.3}: {} peak(s) in {} samples",
        threshold_percentile,
        threshold,
        peaks.len(),
        ts.len()
    );
    PeakDetection { threshold, peaks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn constant_signal_has_no_peaks() {
        let ts = TimeSeries::new(30.0, vec![10.0; 10]);
        let det = detect_peaks(&ts, 75.0);
        assert_eq!(det.threshold, 10.0);
        assert!(det.peaks.is_empty());
    }

    #[test]
    fn first_sample_is_never_a_peak() {
        let ts = TimeSeries::new(30.0, vec![9.0, 5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0]);
        let det = detect_peaks(&ts, 75.0);
        assert!((det.threshold - 6.0).abs() < 1e-12);
        assert_eq!(det.indices(), vec![4]);
        assert_eq!(det.peaks[0].value, 9.0);
    }

    #[test]
    fn plateaus_are_not_peaks() {
        let data = [1.0, 5.0, 5.0, 1.0, 2.0, 6.0, 2.0];
        let peaks = find_peaks(&data, 0.0);
        assert_eq!(peaks.iter().map(|p| p.index).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn peaks_below_threshold_are_dropped() {
        let data = [0.0, 3.0, 0.0, 8.0, 0.0, 4.0, 0.0];
        let peaks = find_peaks(&data, 4.0);
        assert_eq!(peaks.iter().map(|p| p.index).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn short_series_yield_empty_set() {
        assert!(find_peaks(&[], 0.0).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0).is_empty());
        let det = detect_peaks(&TimeSeries::new(30.0, vec![1.0, 3.0]), 75.0);
        assert!(det.peaks.is_empty());
    }

    #[test]
    fn every_peak_is_a_strict_local_max_above_threshold() {
        let mut rng = StdRng::seed_from_u64(7);
        let data: Vec<f64> = (0..600)
            .map(|i| {
                let t = i as f64 / 30.0;
                100.0 + 4.0 * (2.0 * std::f64::consts::PI * 1.2 * t).sin() + rng.gen_range(-1.0..1.0)
            })
            .collect();
        let ts = TimeSeries::new(30.0, data);
        let det = detect_peaks(&ts, 75.0);
        assert!(!det.peaks.is_empty());
        for peak in &det.peaks {
            let i = peak.index;
            assert!(i >= 1 && i + 1 < ts.len());
            assert!(ts.data[i] > ts.data[i - 1]);
            assert!(ts.data[i] > ts.data[i + 1]);
            assert!(peak.value >= det.threshold);
            assert_eq!(peak.value, ts.data[i]);
        }
        for pair in det.peaks.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }
}
