use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use keyloc_cli::{configure_threads, load_keying_config, run_green_screen, AppResult, GreenScreenRun, HeadlessViewer, SnapshotViewer, Viewer};
use keyloc_keying::{Hsv, KeyingConfig, HUE_MAX};
use log::{error, info};

/// Replace a key colour in a frame (or a directory of frames) with a background image
#[derive(Parser, Debug)]
#[command(name = "green_screen", version)]
struct Args {
    /// Frame to key, or a directory of frames processed in name order
    #[arg(short, long)]
    input: PathBuf,

    /// Image composited where the key colour is found; resized to each frame
    #[arg(short, long)]
    background: PathBuf,

    /// Key hue, 0-180
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(0..=HUE_MAX as i64))]
    hue: u8,

    /// Minimum saturation of keyed pixels
    #[arg(long, default_value_t = 100)]
    saturation: u8,

    /// Minimum value (brightness) of keyed pixels
    #[arg(long, default_value_t = 100)]
    value: u8,

    /// Output file, or output directory when the input is a directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keying configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not write window snapshots
    #[arg(long)]
    headless: bool,

    /// Where window snapshots are written
    #[arg(long, default_value = "windows")]
    window_dir: PathBuf,
}

fn run(args: Args) -> AppResult<usize> {
    let config = match &args.config {
        Some(path) => load_keying_config(path)?,
        None => KeyingConfig::default(),
    };
    configure_threads(config.n_threads)?;

    let job = GreenScreenRun {
        input: args.input,
        background: args.background,
        target: Hsv::new(args.hue, args.saturation, args.value),
        output: args.output,
        config,
    };

    let mut viewer: Box<dyn Viewer> = if args.headless {
        Box::new(HeadlessViewer::new())
    } else {
        Box::new(SnapshotViewer::new(&args.window_dir))
    };
    run_green_screen(&job, viewer.as_mut())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(frames) => info!("processed {} frame(s)", frames),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
