use std::sync::Arc;

use clap::Parser;

use handwave::actions::{SystemVolume, VolumeSink};
use handwave::cli::{list_cameras, Args, Command};
use handwave::config::Config;
use handwave::gesture::RuleSet;
use handwave::server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Some(Command::ListCameras) = args.command {
        list_cameras();
        return;
    }

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_to(&mut config);

    // Reject a malformed gesture table before any camera loop starts. The
    // built-in table is disjoint by construction; this keeps the check on
    // the startup path where a future configurable table would need it.
    let rules = RuleSet::standard();
    log::info!("loaded {} gesture rules", rules.len());

    match SystemVolume::new().current() {
        Ok(level) => log::info!("initial volume: {}%", (level * 100.0).round() as u32),
        Err(e) => log::warn!("couldn't read system volume: {}", e),
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    ctrlc::set_handler(move || {
        log::info!("received ctrl-c, shutting down");
        let _ = shutdown_tx.send(true);
    })?;

    server::run_server(Arc::new(config), shutdown_rx).await?;

    Ok(())
}
