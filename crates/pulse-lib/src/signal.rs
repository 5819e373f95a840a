use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz (frames per second for video sources)
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Suffix of the series starting at `start`, keeping the sampling rate.
    pub fn suffix(&self, start: usize) -> TimeSeries {
        let start = start.min(self.data.len());
        TimeSeries {
            fs: self.fs,
            data: self.data[start..].to_vec(),
        }
    }
}

/// A detected local maximum: position within the analysed series and its height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub value: f64,
}

/// Two peaks spanning one heartbeat interval, in ascending index order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedPair {
    pub first: Peak,
    pub second: Peak,
}

impl SelectedPair {
    pub fn frames_between(&self) -> isize {
        self.second.index as isize - self.first.index as isize
    }

    pub fn indices(&self) -> [usize; 2] {
        [self.first.index, self.second.index]
    }
}
