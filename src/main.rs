//! Skyfalltui: swap-to-match puzzle in the terminal with skyfall refills and board quakes.

mod app;
mod board;
mod camera;
mod error;
mod game;
mod input;
mod kinds;
mod matcher;
mod mutator;
mod selection;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Smallest board side that can hold a run.
const MIN_SIDE: usize = 3;

/// Environment variable that overrides `--log-level` with a full filter directive.
const LOG_ENV: &str = "SKYFALL_LOG";

/// Options derived from CLI that affect board rules (size, kinds, quake tuning).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub kinds: u8,
    pub seed: Option<u64>,
    pub quake_frame_limit: u32,
    pub quake_clear_chance: f64,
    pub drag_enabled: bool,
    pub shake_enabled: bool,
    pub animate: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            kinds: 5,
            seed: None,
            quake_frame_limit: 100,
            quake_clear_chance: 0.001,
            drag_enabled: true,
            shake_enabled: true,
            animate: true,
        }
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            rows: args.rows.max(MIN_SIDE),
            cols: args.cols.max(MIN_SIDE),
            kinds: args.kinds,
            seed: args.seed,
            quake_frame_limit: args.quake_limit,
            quake_clear_chance: args.quake_chance,
            drag_enabled: !args.no_drag,
            shake_enabled: !args.no_shake,
            animate: !args.no_animation,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path, &args.log_level)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig::from(&args);
    let mut app = App::new(&args, &config, theme)?;
    app.run()?;
    Ok(())
}

/// Log to a file; the terminal belongs to the board.
fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing tracing subscriber")?;
    Ok(())
}

/// Swap-to-match puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "skyfalltui",
    version,
    about = "Swap-to-match puzzle in the terminal. Line up three or more pieces; new ones fall from the sky.",
    long_about = "Skyfalltui is a terminal match-three puzzle.\n\n\
        Press the mouse on a piece, drag it onto a neighbour and release to swap. A swap that \
        lines up three or more pieces of one kind clears them; the pieces above fall and new \
        ones drop in from the top. Swaps that match nothing are refused.\n\n\
        CONTROLS:\n  Mouse drag   Swap          b (held)   Bomb the selected piece\n  \
        x (held)     Quake         a / d      Rotate the board\n  \
        p            Pause         q / Esc    Quit\n\n\
        Quakes randomly knock pieces loose while held, up to --quake-limit ticks. \
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board rows (at least 3).
    #[arg(long, default_value = "10", value_name = "ROWS")]
    pub rows: usize,

    /// Board columns (at least 3).
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub cols: usize,

    /// Number of piece kinds in play.
    #[arg(short, long, default_value = "5", value_name = "N", value_parser = clap::value_parser!(u8).range(2..=6))]
    pub kinds: u8,

    /// RNG seed for a reproducible board. Random if not set.
    #[arg(short, long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Ticks a single held quake may last before it stops until the key is released.
    #[arg(long, default_value = "100", value_name = "TICKS")]
    pub quake_limit: u32,

    /// Per-tick chance that a quake knocks out any given piece.
    #[arg(long, default_value = "0.001", value_name = "P", value_parser = parse_probability)]
    pub quake_chance: f64,

    /// Disable dragging the selected piece with the pointer.
    #[arg(long)]
    pub no_drag: bool,

    /// Disable the quake key.
    #[arg(long)]
    pub no_shake: bool,

    /// Game logic ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the clear flash and shrinking pieces.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file. Nothing is logged if not set.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log filter when SKYFALL_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

/// A probability in 0..=1.
fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{s} is not between 0 and 1"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
