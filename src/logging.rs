use anyhow::{Context, Result};
use log::LevelFilter;
use std::{fs::OpenOptions, path::Path, str::FromStr};

/// The terminal is in raw mode while playing, so logs only ever go to a file.
/// Without one no logger is installed and the macros are no-ops.
pub(crate) fn init(log_file: Option<&Path>, level: &str) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    env_logger::builder()
        .filter_level(parse_level(level))
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already installed")?;
    Ok(())
}

fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or(LevelFilter::Info)
}
