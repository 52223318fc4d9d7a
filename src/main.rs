use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use dicomscope::utils::truncate_for_display;
use dicomscope::{Capabilities, InputKind, ViewerConfig, ViewportController};

const APP_NAME: &str = "dicomscope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Auto,
    Single,
    Archive,
}

/// Resolve the series in a DICOM file or ZIP archive.
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(version)]
struct Args {
    /// DICOM object or ZIP archive to load
    path: PathBuf,

    /// How to interpret the input
    #[arg(long, value_enum, default_value = "auto")]
    kind: KindArg,

    /// Viewer config (TOML)
    #[arg(short, long, env = "DICOMSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Abort the load after this many milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Series to select after loading
    #[arg(long, default_value_t = 0)]
    series: usize,

    /// Skip pixel decoding and show placeholders
    #[arg(long)]
    no_decode: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let deadline = args
        .deadline_ms
        .map(Duration::from_millis)
        .or_else(|| config.load_deadline());

    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let name = args.path.file_name().and_then(|name| name.to_str());
    let kind = match args.kind {
        KindArg::Auto => InputKind::detect(name, &bytes),
        KindArg::Single => InputKind::Single,
        KindArg::Archive => InputKind::Archive,
    };

    let capabilities = if args.no_decode {
        Capabilities::dicom().without_decoder()
    } else {
        Capabilities::dicom()
    };
    let controller = ViewportController::new(capabilities, config);
    controller
        .load_named(name, bytes, kind, deadline)
        .await
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    controller.select_series(args.series);

    let session = controller.snapshot();
    println!(
        "{} | {} series",
        session.phase().label(),
        session.series_count()
    );
    for (index, series) in session.series().iter().enumerate() {
        let marker = if index == session.current_series_index() {
            "▶"
        } else {
            " "
        };
        let synthetic = if series.is_synthetic() {
            " (unrecognized)"
        } else {
            ""
        };
        println!(
            "{marker} [{index}] {} | {} | {} frame(s){synthetic}",
            series.series_id(),
            truncate_for_display(series.description()),
            series.len(),
        );
    }

    if let Some(rendered) = controller.render_current() {
        let frame = &rendered.frame;
        match &rendered.warning {
            Some(warning) => println!(
                "frame 0: placeholder {}x{} ({warning})",
                frame.width(),
                frame.height()
            ),
            None => println!("frame 0: decoded {}x{}", frame.width(), frame.height()),
        }
    }

    Ok(())
}
