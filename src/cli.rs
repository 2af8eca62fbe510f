use std::{path::PathBuf, sync::OnceLock};

use clap::Parser;

/// Watches game server state snapshots and raises alerts when they change.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the config file.
    #[arg(short, long, default_value = "watcher.toml")]
    pub config: PathBuf,
    /// Path to the vars file used to render the config file.
    #[arg(long, default_value = "watcher.vars")]
    pub vars: PathBuf,
}

static ARGS: OnceLock<Args> = OnceLock::new();

pub fn get_cli_args() -> &'static Args {
    ARGS.get_or_init(Args::parse)
}
