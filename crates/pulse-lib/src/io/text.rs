use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Comment header carrying the sampling rate, as written by `write_series_header`.
const FS_HEADER: &str = "fs=";

/// A brightness series plus the sampling rate its header declares, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessSeries {
    pub fs: Option<f64>,
    pub samples: Vec<f64>,
}

impl BrightnessSeries {
    /// Pick the sampling rate from the header and/or an explicit value.
    /// Both present must agree; neither present is an error.
    pub fn resolve_fs(&self, explicit: Option<f64>) -> Result<f64> {
        match (explicit, self.fs) {
            (Some(flag), Some(header)) if (flag - header).abs() > 1e-9 * header.abs().max(1.0) => {
                anyhow::bail!(
                    "sampling rate {} disagrees with the series header fs={}",
                    flag,
                    header
                )
            }
            (Some(fs), _) | (None, Some(fs)) => Ok(fs),
            (None, None) => {
                anyhow::bail!("no sampling rate: the series has no '# fs=' header, pass --fs")
            }
        }
    }
}

/// Sampling rate from a `# fs=<value>` comment line, `None` for other lines.
fn parse_fs_header(line: &str, line_no: usize) -> Result<Option<f64>> {
    let Some(comment) = line.strip_prefix('#') else {
        return Ok(None);
    };
    let Some(value) = comment.trim().strip_prefix(FS_HEADER) else {
        return Ok(None);
    };
    let fs: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("line {} has a malformed fs header: {}", line_no, line))?;
    if !(fs > 0.0 && fs.is_finite()) {
        anyhow::bail!("line {} declares a non-positive fs: {}", line_no, line);
    }
    Ok(Some(fs))
}

/// Parse a series with an optional `# fs=<value>` header line.
pub fn parse_brightness_file(text: &str) -> Result<BrightnessSeries> {
    let mut fs = None;
    for (idx, line) in text.lines().enumerate() {
        if let Some(declared) = parse_fs_header(line.trim(), idx + 1)? {
            if fs.is_some_and(|seen: f64| seen != declared) {
                anyhow::bail!("line {} repeats the fs header with a different value", idx + 1);
            }
            fs = Some(declared);
        }
    }
    Ok(BrightnessSeries {
        fs,
        samples: parse_brightness_series(text)?,
    })
}

/// Read a series and its optional fs header from disk.
pub fn read_brightness_file(path: &Path) -> Result<BrightnessSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_brightness_file(&text)
}

/// Write the `# fs=<value>` header line.
pub fn write_series_header<W: Write>(mut out: W, fs: f64) -> Result<()> {
    writeln!(out, "# {}{}", FS_HEADER, fs).context("writing series header")?;
    Ok(())
}

/// Parse a newline-delimited brightness series, ignoring blank/comment lines.
pub fn parse_brightness_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not a number: {}", idx + 1, trimmed))?;
        if !val.is_finite() {
            anyhow::bail!("line {} is not a finite sample: {}", idx + 1, trimmed);
        }
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no brightness samples found");
    }
    Ok(out)
}

/// Write one sample per line, the format `parse_brightness_series` reads back.
pub fn write_brightness_series<W: Write>(mut out: W, samples: &[f64]) -> Result<()> {
    for sample in samples {
        writeln!(out, "{}", sample).context("writing brightness sample")?;
    }
    out.flush().context("flushing brightness series")?;
    Ok(())
}
