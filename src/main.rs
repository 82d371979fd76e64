//! SteelSeriesSvc entry point
//!
//! Runs the accent sync engine in the foreground, installs the service, or
//! hands the process to the service control manager.

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use steelsvc::engine::{event_channel, EngineEvent};
use steelsvc::error::EngineError;
use steelsvc::service::{self, Dispatch, ServiceError};
use steelsvc::{accent, console, daemon, logging};
use steelsvc_transport::HidDiscovery;
use tracing::{debug, info, warn};

mod cli;
use cli::{Cli, Commands};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        // Unknown commands fall through to usage and service dispatch
        Err(_) => Cli {
            verbose: false,
            command: None,
        },
    };

    logging::init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e) as i32);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Start) => start(),
        Some(Commands::Install) => install(),
        None => {
            Cli::command().print_long_help()?;
            if service::dispatch()? == Dispatch::NotAService {
                debug!("Not started by the service control manager");
            }
            Ok(())
        }
    }
}

fn start() -> Result<()> {
    let (events, rx) = event_channel();

    let stop = events.clone();
    ctrlc::set_handler(move || {
        let _ = stop.send(EngineEvent::Stop);
    })
    .context("Failed to set Ctrl-C handler")?;

    let close_events = events.clone();
    let resolver = accent::default_resolver();
    let reason = daemon::run_blocking(&HidDiscovery::new(), &*resolver, events, rx, |engine| {
        if let Err(e) = console::install_close_handler(close_events, engine.stop_latch()) {
            warn!("Closing the console will not reset the keyboard: {}", e);
        }
        info!("Running, press Ctrl-C to stop");
    })?;

    if reason.exit_code() != 0 {
        bail!("Engine stopped: {reason}");
    }
    Ok(())
}

fn install() -> Result<()> {
    service::install()?;
    println!("Service installed successfully");
    Ok(())
}

fn exit_code(e: &anyhow::Error) -> u32 {
    let code = if let Some(e) = e.downcast_ref::<EngineError>() {
        Some(e.exit_code())
    } else if let Some(e) = e.downcast_ref::<ServiceError>() {
        e.os_code()
    } else {
        None
    };
    code.filter(|&c| c != 0).unwrap_or(1)
}
