use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "quadtap")]
#[command(about = "Tap the quadrant that matches the number. Double-click to stop.", long_about = None)]
pub(crate) struct Args {
    /// FPS cap (render rate)
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Fixed RNG seed for the challenge sequence
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Max gap between two clicks that counts as a double tap
    #[arg(long)]
    pub(crate) double_tap_ms: Option<u64>,

    /// Monochrome rendering
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Settings file (defaults to settings.json in the user config dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// error | warn | info | debug | trace
    #[arg(long)]
    pub(crate) log_level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) double_tap_ms: u64,
    pub(crate) enable_color: bool,
    pub(crate) seed: Option<u64>,
    pub(crate) log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            double_tap_ms: 300,
            enable_color: true,
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub(crate) fn apply_args(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if let Some(seed) = args.seed {
            self.seed = Some(seed);
        }
        if let Some(ms) = args.double_tap_ms {
            self.double_tap_ms = ms;
        }
        if args.no_color {
            self.enable_color = false;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        self
    }

    pub(crate) fn fps(&self) -> u32 {
        self.fps_cap.clamp(10, 240)
    }
}

pub(crate) fn default_settings_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "quadtap", "Quadtap")
        .context("could not resolve project directories")?;
    Ok(proj.config_dir().join("settings.json"))
}

/// Missing or unparsable settings fall back to defaults. A file that exists
/// but does not parse also hands back why, to be logged once logging is up.
pub(crate) fn load_settings(path: &Path) -> (Settings, Option<String>) {
    match fs::read_to_string(path) {
        Ok(s) => match parse_settings(&s) {
            Ok(v) => (v, None),
            Err(e) => (
                Settings::default(),
                Some(format!("ignoring {}: {e}", path.display())),
            ),
        },
        Err(_) => (Settings::default(), None),
    }
}

fn parse_settings(s: &str) -> Result<Settings> {
    Ok(serde_json::from_str::<Settings>(s)?)
}

pub(crate) fn resolve(args: &Args) -> Result<(Settings, Option<String>)> {
    let path = match &args.config {
        Some(p) => p.clone(),
        None => default_settings_path()?,
    };
    let (settings, warning) = load_settings(&path);
    Ok((settings.apply_args(args), warning))
}
