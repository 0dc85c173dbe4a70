mod activity;
mod catalog;
mod cli;
mod config;
mod notify;
mod session;
mod views;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mmakwany",
    about = "Guest console for the Mmakwany Guest House demo"
)]
pub struct Args {
    #[arg(short, long, help = "Run one command and exit (e.g. -c \"login\")")]
    pub command: Option<String>,

    #[arg(
        long,
        env = "MMAKWANY_DATA_DIR",
        help = "Data directory (default: ~/.mmakwany)"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let data_dir = args.data_dir.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|home| home.join(".mmakwany"))
            .unwrap_or_else(|| PathBuf::from(".mmakwany"))
    });
    std::fs::create_dir_all(&data_dir)?;

    let cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load(&data_dir).unwrap_or_default()
    };

    let store = session::JsonFileStore::new(&data_dir, cfg.session_defaults());
    let activity = activity::ActivityLog::new(&data_dir)?;

    let ctx = cli::Context {
        config: cfg,
        store: &store,
        activity: RefCell::new(activity),
        page: RefCell::new(cli::Page::Home),
        redeemed: RefCell::new(HashSet::new()),
        selected_menu: RefCell::new(None),
    };

    if let Some(command) = &args.command {
        cli::run_once(&ctx, command)
    } else {
        cli::run_repl(&ctx)
    }
}
