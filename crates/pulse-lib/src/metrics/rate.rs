use crate::{
    config::PairStrategy,
    error::PulseError,
    signal::{Peak, SelectedPair},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRate {
    pub bpm: f64,
    pub frames_between_peaks: usize,
    pub pair: SelectedPair,
}

/// Positions within `peaks`, ascending by height. The sort is stable, so the
/// last entry is the highest peak and ties go to the later one.
fn rank_by_height(peaks: &[Peak]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..peaks.len()).collect();
    ranked.sort_by(|&a, &b| peaks[a].value.total_cmp(&peaks[b].value));
    ranked
}

/// Pick the two peaks that bound one beat.
pub fn select_pair(
    peaks: &[Peak],
    strategy: PairStrategy,
    threshold: f64,
) -> Result<SelectedPair, PulseError> {
    let ranked = rank_by_height(peaks);
    let top = *ranked
        .last()
        .ok_or(PulseError::NoPeaksDetected { threshold })?;
    let no_successor = || PulseError::NoSubsequentPeak {
        index: peaks[top].index,
        value: peaks[top].value,
    };
    match strategy {
        PairStrategy::StrongestWithSuccessor => {
            let next = peaks.get(top + 1).copied().ok_or_else(no_successor)?;
            Ok(SelectedPair {
                first: peaks[top],
                second: next,
            })
        }
        PairStrategy::TwoStrongest => {
            let runner_up = ranked
                .iter()
                .rev()
                .nth(1)
                .map(|&i| peaks[i])
                .ok_or_else(no_successor)?;
            let (first, second) = if runner_up.index < peaks[top].index {
                (runner_up, peaks[top])
            } else {
                (peaks[top], runner_up)
            };
            Ok(SelectedPair { first, second })
        }
    }
}

/// Beats per minute for a pair `frames` apart at `fs` frames per second.
pub fn bpm_from_interval(frames: usize, fs: f64) -> f64 {
    60.0 * fs / frames as f64
}

/// Turn the detected peaks into a heart rate.
pub fn estimate_rate(
    peaks: &[Peak],
    fs: f64,
    threshold: f64,
    strategy: PairStrategy,
) -> Result<HeartRate, PulseError> {
    if !(fs > 0.0 && fs.is_finite()) {
        return Err(PulseError::InvalidSamplingRate { fs });
    }
    if peaks.is_empty() {
        return Err(PulseError::NoPeaksDetected { threshold });
    }
    let pair = select_pair(peaks, strategy, threshold)?;
    let frames = pair.frames_between();
    if frames <= 0 {
        return Err(PulseError::DegenerateInterval { frames });
    }
    let frames_between_peaks = frames as usize;
    let bpm = bpm_from_interval(frames_between_peaks, fs);
    log::debug!(
        "pair {:?} spans {} frames at {} fps -> {:.2} bpm",
        pair.indices(),
        frames_between_peaks,
        fs,
        bpm
    );
    Ok(HeartRate {
        bpm,
        frames_between_peaks,
        pair,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peaks(pairs: &[(usize, f64)]) -> Vec<Peak> {
        pairs.iter()
            .map(|&(index, value)| Peak { index, value })
            .collect()
    }

    #[test]
    fn sixty_bpm_from_thirty_frame_gap() {
        let p = peaks(&[(12, 10.0), (42, 8.0)]);
        let rate = estimate_rate(&p, 30.0, 5.0, PairStrategy::default()).unwrap();
        assert_eq!(rate.frames_between_peaks, 30);
        assert!((rate.bpm - 60.0).abs() < 1e-12);
        assert_eq!(rate.pair.indices(), [12, 42]);
    }

    #[test]
    fn successor_not_runner_up_is_paired() {
        let p = peaks(&[(5, 7.0), (20, 12.0), (38, 6.0), (60, 11.0)]);
        let pair = select_pair(&p, PairStrategy::StrongestWithSuccessor, 0.0).unwrap();
        assert_eq!(pair.indices(), [20, 38]);
    }

    #[test]
    fn two_strongest_orders_pair_by_time() {
        let p = peaks(&[(5, 7.0), (20, 12.0), (38, 6.0), (60, 11.0)]);
        let pair = select_pair(&p, PairStrategy::TwoStrongest, 0.0).unwrap();
        assert_eq!(pair.indices(), [20, 60]);

        let p = peaks(&[(5, 11.0), (20, 12.0)]);
        let pair = select_pair(&p, PairStrategy::TwoStrongest, 0.0).unwrap();
        assert_eq!(pair.indices(), [5, 20]);
    }

    #[test]
    fn empty_peak_set_reports_threshold() {
        let err = estimate_rate(&[], 30.0, 6.5, PairStrategy::default()).unwrap_err();
        match err {
            PulseError::NoPeaksDetected { threshold } => assert_eq!(threshold, 6.5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn strongest_last_has_no_successor() {
        let p = peaks(&[(3, 4.0), (9, 5.0), (15, 9.0)]);
        let err = estimate_rate(&p, 30.0, 0.0, PairStrategy::default()).unwrap_err();
        assert!(matches!(err, PulseError::NoSubsequentPeak { index: 15, .. }));
    }

    #[test]
    fn single_peak_cannot_be_paired_either_way() {
        let p = peaks(&[(4, 9.0)]);
        for strategy in [PairStrategy::StrongestWithSuccessor, PairStrategy::TwoStrongest] {
            let err = estimate_rate(&p, 30.0, 6.0, strategy).unwrap_err();
            assert!(matches!(err, PulseError::NoSubsequentPeak { index: 4, .. }));
        }
    }

    #[test]
    fn tied_maxima_resolve_to_later_peak() {
        let p = peaks(&[(2, 9.0), (10, 9.0), (19, 3.0)]);
        let pair = select_pair(&p, PairStrategy::StrongestWithSuccessor, 0.0).unwrap();
        assert_eq!(pair.indices(), [10, 19]);
    }

    #[test]
    fn out_of_order_peaks_are_degenerate() {
        let p = peaks(&[(30, 9.0), (12, 3.0)]);
        let err = estimate_rate(&p, 30.0, 0.0, PairStrategy::default()).unwrap_err();
        assert!(matches!(err, PulseError::DegenerateInterval { frames: -18 }));
    }

    #[test]
    fn non_positive_fps_is_rejected() {
        let p = peaks(&[(1, 2.0), (3, 1.0)]);
        let err = estimate_rate(&p, 0.0, 0.0, PairStrategy::default()).unwrap_err();
        assert!(matches!(err, PulseError::InvalidSamplingRate { .. }));
    }
}
