mod api;
mod budgets;
mod config;
mod logging;
mod models;
mod run;
mod session;
mod ui;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env()?;
    logging::init(&config)?;
    let session = session::Session::load(&config.session_path())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match args.len() {
        1 => run::as_tui(&config, session, runtime.handle()),
        2.. => run::as_cli(&args, &config, session, &runtime),
        _ => {
            eprintln!("Usage: pftui [command]");
            Ok(())
        }
    }
}
