use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the heartbeat interval is chosen from the detected peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairStrategy {
    /// Strongest peak and the peak that follows it in time.
    #[default]
    StrongestWithSuccessor,
    /// The two highest peaks, wherever they sit.
    TwoStrongest,
}

/// Tunables for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Percentile of the trimmed signal a peak must reach (0–100).
    pub threshold_percentile: f64,
    pub pairing: PairStrategy,
    /// Minimum raw samples before analysis; values below 2 are raised to 2.
    pub min_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_percentile: 75.0,
            pairing: PairStrategy::StrongestWithSuccessor,
            min_samples: 2,
        }
    }
}

impl PipelineConfig {
    pub fn required_samples(&self) -> usize {
        self.min_samples.max(2)
    }

    /// Loaded configs are range-checked; this only guards hand-built ones.
    pub fn percentile(&self) -> f64 {
        self.threshold_percentile.clamp(0.0, 100.0)
    }
}

/// Accept a threshold percentile only inside 0..=100.
pub fn check_percentile(p: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&p) {
        anyhow::bail!("threshold percentile must be within 0..=100, got {}", p);
    }
    Ok(p)
}

pub fn parse_config(text: &str) -> Result<PipelineConfig> {
    let cfg: PipelineConfig = toml::from_str(text).context("parsing pipeline config")?;
    check_percentile(cfg.threshold_percentile).context("threshold_percentile")?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("in {}", path.display()))
}
