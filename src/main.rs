mod app;
mod config;
mod game;
mod input;
mod logging;
mod model;
mod ports;
mod render;
mod scheduler;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    app::run(config::Args::parse())
}
