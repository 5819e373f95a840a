use crate::{
    error::PulseError,
    metrics::stats::{median, sign},
    signal::TimeSeries,
};
use serde::{Deserialize, Serialize};

/// Where the settled part of a recording begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Onset {
    /// Median of the whole raw series.
    pub median: f64,
    /// Sign of the first sample relative to the median.
    pub first_sign: i8,
    /// First index whose sign differs from `first_sign`, 0 when none does.
    pub index: usize,
}

/// Find the first polarity flip of the raw series around its median.
///
/// The lead-in before the finger seats on the lens sits on one side of the
/// median; the flip marks where the pulsatile part starts.
pub fn locate_onset(raw: &TimeSeries, min_samples: usize) -> Result<Onset, PulseError> {
    let required = min_samples.max(2);
    if raw.len() < required {
        return Err(PulseError::InsufficientData {
            samples: raw.len(),
            required,
        });
    }
    let median = median(&raw.data).ok_or(PulseError::InsufficientData {
        samples: 0,
        required,
    })?;
    let first_sign = sign(raw.data[0] - median);
    let index = raw
        .data
        .iter()
        .position(|&x| sign(x - median) != first_sign)
        .unwrap_or(0);
    Ok(Onset {
        median,
        first_sign,
        index,
    })
}

/// Locate the onset and cut the raw series down to the suffix starting there.
pub fn trim_lead_in(raw: &TimeSeries, min_samples: usize) -> Result<(Onset, TimeSeries), PulseError> {
    let onset = locate_onset(raw, min_samples)?;
    let trimmed = raw.suffix(onset.index);
    log::debug!(
        "median {:.3}, first sign {}, onset {} of {} samples",
        onset.median,
        onset.first_sign,
        onset.index,
        raw.len()
    );
    Ok((onset, trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(data: &[f64]) -> TimeSeries {
        TimeSeries::new(30.0, data.to_vec())
    }

    #[test]
    fn onset_at_first_flip() {
        let raw = ts(&[5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0]);
        let onset = locate_onset(&raw, 2).unwrap();
        assert_eq!(onset.median, 5.0);
        assert_eq!(onset.first_sign, 0);
        assert_eq!(onset.index, 3);
    }

    #[test]
    fn dark_lead_in_is_discarded() {
        let raw = ts(&[40.0, 42.0, 41.0, 120.0, 118.0, 125.0, 119.0, 40.0]);
        let (onset, trimmed) = trim_lead_in(&raw, 2).unwrap();
        assert_eq!(onset.first_sign, -1);
        assert_eq!(onset.index, 3);
        assert_eq!(trimmed.data, vec![120.0, 118.0, 125.0, 119.0, 40.0]);
        assert_eq!(trimmed.fs, raw.fs);
    }

    #[test]
    fn no_sign_change_keeps_whole_signal() {
        let raw = ts(&[10.0; 10]);
        let (onset, trimmed) = trim_lead_in(&raw, 2).unwrap();
        assert_eq!(onset.index, 0);
        assert_eq!(trimmed, raw);
    }

    #[test]
    fn trimmed_is_suffix_of_raw() {
        let raw = ts(&[1.0, 2.0, 8.0, 3.0, 9.0, 2.0, 7.0, 1.0, 6.0]);
        let (onset, trimmed) = trim_lead_in(&raw, 2).unwrap();
        assert!(onset.index < raw.len());
        for (k, value) in trimmed.data.iter().enumerate() {
            assert_eq!(*value, raw.data[onset.index + k]);
        }
        assert_eq!(trimmed.len() + onset.index, raw.len());
    }

    #[test]
    fn too_few_samples_is_an_error() {
        let err = locate_onset(&ts(&[1.0]), 2).unwrap_err();
        assert!(matches!(
            err,
            PulseError::InsufficientData {
                samples: 1,
                required: 2
            }
        ));
        assert!(locate_onset(&ts(&[]), 0).is_err());
    }

    #[test]
    fn configured_minimum_is_honoured() {
        let err = locate_onset(&ts(&[1.0, 2.0, 3.0]), 5).unwrap_err();
        assert!(matches!(err, PulseError::InsufficientData { required: 5, .. }));
    }
}
