use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use plotters::prelude::*;
use pulse_lib::{
    config::{check_percentile, load_config, PairStrategy, PipelineConfig},
    error::PulseError,
    io::{csv as csv_io, text as text_io, video as video_io},
    pipeline::{analyze_signal, PulseAnalysis},
    plot::{figure_from_analysis, Figure, PlotBackend, Series},
    signal::TimeSeries,
};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "pulse",
    version,
    about = "Estimate heart rate from a fingertip-on-camera video"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Pairing {
    /// Strongest peak and the one right after it
    #[value(name = "strongest-with-successor")]
    StrongestWithSuccessor,
    /// The two highest peaks
    #[value(name = "two-strongest")]
    TwoStrongest,
}

impl From<Pairing> for PairStrategy {
    fn from(value: Pairing) -> Self {
        match value {
            Pairing::StrongestWithSuccessor => PairStrategy::StrongestWithSuccessor,
            Pairing::TwoStrongest => PairStrategy::TwoStrongest,
        }
    }
}

#[derive(Args, Debug)]
struct AnalysisArgs {
    /// TOML file with pipeline settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Percentile of the trimmed signal a peak must reach
    #[arg(long)]
    threshold_percentile: Option<f64>,
    #[arg(long, value_enum)]
    pairing: Option<Pairing>,
    /// Render the annotated signal to a PNG
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Export the annotated signal as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print a one-line summary instead of JSON
    #[arg(long)]
    summary: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a video file (mp4/mov/avi); use "-" to read it from stdin
    AnalyzeVideo {
        #[arg(long)]
        input: PathBuf,
        /// Container extension when reading from stdin
        #[arg(long, default_value = "mp4")]
        format: String,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Analyse newline-delimited brightness samples from stdin or --input file
    AnalyzeSeries {
        /// Sampling rate in Hz; required unless the series has a "# fs=" header
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Print the per-frame mean brightness of a video, one sample per line
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "mp4")]
        format: String,
    },
    /// Print frame rate, frame count and duration of a video
    Info {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::AnalyzeVideo {
            input,
            format,
            analysis,
        } => cmd_analyze_video(&input, &format, &analysis)?,
        Commands::AnalyzeSeries {
            fs,
            input,
            analysis,
        } => cmd_analyze_series(fs, input.as_deref(), &analysis)?,
        Commands::Extract { input, format } => cmd_extract(&input, &format)?,
        Commands::Info { input } => cmd_info(&input)?,
    }
    Ok(())
}

fn pipeline_config(args: &AnalysisArgs) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(p) = args.threshold_percentile {
        cfg.threshold_percentile = check_percentile(p).context("--threshold-percentile")?;
    }
    if let Some(pairing) = args.pairing {
        cfg.pairing = pairing.into();
    }
    Ok(cfg)
}

fn read_samples(input: Option<&Path>) -> Result<text_io::BrightnessSeries> {
    match input {
        Some(path) => text_io::read_brightness_file(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_brightness_file(&buf)
        }
    }
}

fn user_error(err: PulseError) -> anyhow::Error {
    anyhow!("{}: {}", err.hint(), err)
}

fn report(analysis: &PulseAnalysis, args: &AnalysisArgs) -> Result<()> {
    if let Some(path) = &args.csv {
        csv_io::save_annotated_csv(path, analysis)?;
    }
    if let Some(path) = &args.plot {
        let fig = figure_from_analysis(analysis, 4096);
        PngBackend { path: path.clone() }.draw(&fig)?;
    }
    if args.summary {
        println!("{}", analysis.summary());
    } else {
        println!("{}", serde_json::to_string(analysis)?);
    }
    Ok(())
}

fn cmd_analyze_series(fs: Option<f64>, input: Option<&Path>, args: &AnalysisArgs) -> Result<()> {
    let cfg = pipeline_config(args)?;
    let series = read_samples(input)?;
    let fs = series.resolve_fs(fs)?;
    let raw = TimeSeries::new(fs, series.samples);
    let analysis = analyze_signal(&raw, &cfg).map_err(user_error)?;
    report(&analysis, args)
}

/// A video on disk, spooled from stdin into a temporary file when needed.
struct VideoInput {
    #[cfg_attr(not(feature = "video"), allow(dead_code))]
    path: PathBuf,
    // removed on drop, after any frame source opened on `path`
    _spool: Option<tempfile::NamedTempFile>,
}

impl VideoInput {
    fn resolve(input: &Path, format: &str) -> Result<Self> {
        if input != Path::new("-") {
            video_io::ensure_supported_container(input)?;
            return Ok(Self {
                path: input.to_path_buf(),
                _spool: None,
            });
        }
        if !video_io::is_supported_container(format) {
            anyhow::bail!(
                "unsupported video container .{} (expected one of {})",
                format,
                video_io::SUPPORTED_CONTAINERS.join(", ")
            );
        }
        let mut spool = tempfile::Builder::new()
            .prefix("pulse-upload-")
            .suffix(&format!(".{}", format.to_ascii_lowercase()))
            .tempfile()
            .context("creating temporary video file")?;
        let bytes = io::copy(&mut io::stdin().lock(), spool.as_file_mut())
            .context("spooling video from stdin")?;
        log::debug!("spooled {} bytes to {}", bytes, spool.path().display());
        Ok(Self {
            path: spool.path().to_path_buf(),
            _spool: Some(spool),
        })
    }
}

#[cfg(feature = "video")]
fn progress_logger() -> impl FnMut(pulse_lib::frames::Progress) {
    let mut last_decile = 0;
    move |p: pulse_lib::frames::Progress| {
        let decile = (p.fraction() * 10.0) as u32;
        if decile > last_decile {
            last_decile = decile;
            log::info!("decoded {}/{} frames", p.decoded, p.total_hint);
        }
    }
}

#[cfg(feature = "video")]
fn cmd_analyze_video(input: &Path, format: &str, args: &AnalysisArgs) -> Result<()> {
    use pulse_lib::{io::video::FfmpegFrameSource, pipeline::analyze_source};

    let cfg = pipeline_config(args)?;
    let video = VideoInput::resolve(input, format)?;
    let analysis = {
        let mut source = FfmpegFrameSource::open(&video.path)?;
        analyze_source(&mut source, &cfg, progress_logger())
    }
    .map_err(user_error)?;
    report(&analysis, args)
}

#[cfg(feature = "video")]
fn cmd_extract(input: &Path, format: &str) -> Result<()> {
    use pulse_lib::{frames::extract_brightness, io::video::FfmpegFrameSource};

    let video = VideoInput::resolve(input, format)?;
    let raw = {
        let mut source = FfmpegFrameSource::open(&video.path)?;
        extract_brightness(&mut source, progress_logger())
    };
    let mut out = io::stdout().lock();
    text_io::write_series_header(&mut out, raw.fs)?;
    text_io::write_brightness_series(out, &raw.data)
}

#[cfg(feature = "video")]
fn cmd_info(input: &Path) -> Result<()> {
    let source = pulse_lib::io::video::FfmpegFrameSource::open(input)?;
    println!("{}", serde_json::to_string(&source.info())?);
    Ok(())
}

#[cfg(not(feature = "video"))]
fn cmd_analyze_video(input: &Path, format: &str, args: &AnalysisArgs) -> Result<()> {
    pipeline_config(args)?;
    let _video = VideoInput::resolve(input, format)?;
    Err(no_video_support())
}

#[cfg(not(feature = "video"))]
fn cmd_extract(input: &Path, format: &str) -> Result<()> {
    let _video = VideoInput::resolve(input, format)?;
    Err(no_video_support())
}

#[cfg(not(feature = "video"))]
fn cmd_info(input: &Path) -> Result<()> {
    video_io::ensure_supported_container(input)?;
    Err(no_video_support())
}

#[cfg(not(feature = "video"))]
fn no_video_support() -> anyhow::Error {
    anyhow!("this build has no video decoding; rebuild with --features video or use analyze-series")
}

/// Renders figures to a PNG file via plotters.
struct PngBackend {
    path: PathBuf,
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        draw_plotters_figure(&self.path, fig)
    }
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (1000, 500));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let ([x_min, x_max], [y_min, y_max]) = fig.bounds().unwrap_or(([0.0, 1.0], [0.0, 1.0]));
    let pad = ((y_max - y_min) * 0.05).max(1e-6);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Pulse".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max.max(x_min + 1.0), (y_min - pad)..(y_max + pad))?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                let style = RGBColor(r, g, b).stroke_width(line.style.width.ceil() as u32);
                let points = line.points.iter().map(|p| (p[0], p[1]));
                let drawn = match line.style.dash_pixels() {
                    Some((dash, gap)) => {
                        chart.draw_series(DashedLineSeries::new(points, dash, gap, style))?
                    }
                    None => chart.draw_series(LineSeries::new(points, style))?,
                };
                drawn
                    .label(line.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
            Series::Markers(markers) => {
                let (r, g, b) = markers.color.rgb();
                let color = RGBColor(r, g, b);
                let radius = markers.radius;
                chart
                    .draw_series(
                        markers
                            .points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), radius, color.filled())),
                    )?
                    .label(markers.name.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), radius, color.filled()));
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
