use std::{fmt::Display, path::PathBuf};

use clap::{Parser, Subcommand};
use eyre::Context;
use fanlog::{Backpressure, Config, Level};

mod demo;
mod emit;

#[derive(Subcommand, Debug)]
pub enum FanlogCmd {
    Demo(demo::Cmd),

    Emit(emit::Cmd),
}

impl Display for FanlogCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FanlogCmd::Demo(cmd) => write!(f, "demo {}", cmd.path.display()),
            FanlogCmd::Emit(cmd) => write!(f, "emit {}", cmd.level),
        }
    }
}

#[derive(Parser)]
#[command(version, long_version = "")]
#[command(about = "Leveled logging that fans every line out to stdout, stderr and files.", long_about = None, disable_help_subcommand = true)]
pub struct Fanlog {
    #[arg(
        global = true,
        long,
        help = "Lowest level that gets through: all, debug, info, warn, error, fatal or off. Overrides FANLOG_LEVEL.",
        display_order = 0
    )]
    pub level: Option<Level>,

    #[arg(
        global = true,
        long,
        help = "Also write lines to this file. It is created or truncated.",
        display_order = 0
    )]
    pub file: Option<PathBuf>,

    #[arg(global = true, long, help = "Also write lines to stdout.", display_order = 1)]
    pub stdout: bool,

    #[arg(global = true, long, help = "Also write lines to stderr.", display_order = 1)]
    pub stderr: bool,

    #[arg(
        global = true,
        long,
        help = "Prefix lines with a timestamp and keep full paths in the call site.",
        display_order = 1
    )]
    pub long: bool,

    #[arg(
        global = true,
        long,
        help = "Lines the file sink may queue before backpressure kicks in. 0 hands each line straight to the writer.",
        display_order = 2
    )]
    pub capacity: Option<usize>,

    #[arg(
        global = true,
        long,
        help = "What to do when the file writer falls behind: block, drop-newest, drop-oldest or timeout:<ms>.",
        display_order = 2
    )]
    pub backpressure: Option<Backpressure>,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Set the level by count instead: -v error, -vv warn, -vvv info, -vvvv debug, more for all.",
        display_order = 999
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: FanlogCmd,
}

impl Fanlog {
    fn verbosity(&self) -> Option<Level> {
        match self.verbose {
            0 => None,
            1 => Some(Level::Error),
            2 => Some(Level::Warn),
            3 => Some(Level::Info),
            4 => Some(Level::Debug),
            5_u8..=u8::MAX => Some(Level::All),
        }
    }

    fn config(&self) -> eyre::Result<Config> {
        let mut config =
            Config::from_env().context("Failed reading logging settings from the environment")?;

        if let Some(level) = self.verbosity().or(self.level) {
            config.threshold = level;
        }
        if let Some(file) = &self.file {
            config.file = Some(file.clone());
        }
        if let Some(capacity) = self.capacity {
            config.file_options.capacity = capacity;
        }
        if let Some(backpressure) = self.backpressure {
            config.file_options.backpressure = backpressure;
        }
        config.stdout |= self.stdout;
        config.stderr |= self.stderr;
        config.long_format |= self.long;

        Ok(config)
    }

    pub fn run(self) -> eyre::Result<()> {
        let config = self.config()?;

        let result = match &self.cmd {
            FanlogCmd::Demo(demo) => demo.run(config),
            FanlogCmd::Emit(emit) => emit.run(config),
        };

        result.with_context(|| format!("Failed running command {}", self.cmd))
    }
}
