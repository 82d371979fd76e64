// CLI definitions using clap

use clap::{Parser, Subcommand};

const DESCRIPTION: &str = "\
SteelSeriesSvc is a service that synchronizes SteelSeries keyboards with the
current user's accent color in real time.

Without a command the usage is printed and the process offers itself to the
service control manager.";

const LICENSE: &str = "\
LICENSE:
    SteelSeriesSvc comes with ABSOLUTELY NO WARRANTY.
    This is free software, and you are welcome to redistribute it under
    the terms of the GNU General Public License, version 2 or later.";

#[derive(Parser)]
#[command(name = "steelsvc")]
#[command(version, about = "Tints MSI SteelSeries keyboards with the Windows accent color")]
#[command(long_about = DESCRIPTION, after_long_help = LICENSE)]
pub struct Cli {
    /// Log every report sent to the keyboard
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as a standalone process until Ctrl-C
    Start,

    /// Install the service system-wide
    Install,
}
